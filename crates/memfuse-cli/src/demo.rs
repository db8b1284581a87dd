use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use memfuse_core::{CallArgs, DType, Module, Scalar, Shape, Signature, Tensor, Value};

/// `forward(x, y, alpha=1.0) -> x + alpha * y` over f32 tensors.
///
/// Once fused, `alpha` never reaches this function because the dispatcher
/// forwards tensors only, so the default applies.
pub fn add_module() -> Module {
    Module::new("demo_add", Signature::new(["x", "y", "alpha"]), add_forward)
}

fn add_forward(args: CallArgs) -> Result<Value> {
    let x = tensor_arg(&args, "x", 0)?;
    let y = tensor_arg(&args, "y", 1)?;
    let alpha = match args.resolve("alpha", 2) {
        None | Some(Value::Scalar(Scalar::None)) => 1.0,
        Some(Value::Scalar(Scalar::Float(v))) => *v as f32,
        Some(Value::Scalar(Scalar::Int(v))) => *v as f32,
        Some(other) => bail!("alpha must be a number, got {other:?}"),
    };

    ensure!(
        x.shape() == y.shape(),
        "shape mismatch: {:?} vs {:?}",
        x.shape().dims(),
        y.shape().dims()
    );
    let xs = f32_values(x)?;
    let ys = f32_values(y)?;
    let out: Vec<f32> = xs.iter().zip(&ys).map(|(a, b)| a + alpha * b).collect();

    Ok(Value::Tensor(f32_tensor(x.shape().clone(), &out)))
}

/// Positional call for one schedule entry: every tensor filled with its
/// 1-based position, then `alpha`.
pub fn call_args(shapes: &[Shape], alpha: f64) -> CallArgs {
    let mut args = CallArgs::new();
    for (i, shape) in shapes.iter().enumerate() {
        let fill = vec![(i + 1) as f32; shape.numel()];
        args = args.arg(f32_tensor(shape.clone(), &fill));
    }
    args.arg(alpha)
}

pub fn first_value(value: &Value) -> Option<f32> {
    let tensor = value.as_tensor()?;
    f32_values(tensor).ok()?.first().copied()
}

fn tensor_arg<'a>(args: &'a CallArgs, name: &str, position: usize) -> Result<&'a Tensor> {
    args.resolve(name, position)
        .and_then(Value::as_tensor)
        .with_context(|| format!("missing tensor argument {name}"))
}

fn f32_tensor(shape: Shape, data: &[f32]) -> Tensor {
    let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
    Tensor::from_cpu_bytes(DType::F32, shape, Bytes::from(bytes))
}

fn f32_values(tensor: &Tensor) -> Result<Vec<f32>> {
    ensure!(tensor.dtype() == DType::F32, "demo module only handles f32");
    let bytes = tensor.bytes();
    ensure!(bytes.len() % 4 == 0, "f32 tensor has invalid byte length");
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
