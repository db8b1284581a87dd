use anyhow::{ensure, Context, Result};
use memfuse_core::Shape;

/// Parses `4x4,4x4;8x8,8x8` into one list of tensor shapes per call.
pub fn parse_schedule(raw: &str) -> Result<Vec<Vec<Shape>>> {
    raw.split(';')
        .map(str::trim)
        .filter(|call| !call.is_empty())
        .map(parse_call)
        .collect::<Result<Vec<_>>>()
        .and_then(|calls| {
            ensure!(!calls.is_empty(), "empty shape schedule");
            Ok(calls)
        })
}

fn parse_call(raw: &str) -> Result<Vec<Shape>> {
    raw.split(',')
        .map(|tensor| parse_shape(tensor.trim()))
        .collect()
}

fn parse_shape(raw: &str) -> Result<Shape> {
    let dims = raw
        .split('x')
        .map(|d| {
            let d: usize = d
                .trim()
                .parse()
                .with_context(|| format!("invalid dimension {d:?} in {raw:?}"))?;
            ensure!(d > 0, "dimensions must be positive: {raw:?}");
            Ok(d)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Shape::from_slice(&dims))
}
