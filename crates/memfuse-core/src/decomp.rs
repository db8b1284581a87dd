use std::collections::BTreeMap;

/// Rewrites from high-level operators to primitive equivalents, keyed by op name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompositionTable {
    rules: BTreeMap<String, String>,
}

impl DecompositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, op: impl Into<String>, primitive: impl Into<String>) {
        self.rules.insert(op.into(), primitive.into());
    }

    pub fn get(&self, op: &str) -> Option<&str> {
        self.rules.get(op).map(String::as_str)
    }

    pub fn contains(&self, op: &str) -> bool {
        self.rules.contains_key(op)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn ops(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

const DEFAULT_RULES: &[(&str, &str)] = &[
    ("aten.detach", "alias(x)"),
    ("aten.gelu_backward", "grad * (cdf(x) + x * pdf(x))"),
    ("aten.leaky_relu_backward", "where(x > 0, grad, grad * slope)"),
    ("aten.sigmoid_backward", "grad * out * (1 - out)"),
    ("aten.threshold_backward", "where(x <= threshold, 0, grad)"),
    ("aten.hardtanh_backward", "where((x <= min) | (x >= max), 0, grad)"),
    ("aten.hardsigmoid_backward", "where((x > -3) & (x < 3), grad / 6, 0)"),
    ("aten.hardswish_backward", "where(x < -3, 0, where(x <= 3, grad * (x / 3 + 0.5), grad))"),
    ("aten.tanh_backward", "grad * (1 - out * out)"),
    ("aten.silu_backward", "grad * sigmoid(x) * (1 + x * (1 - sigmoid(x)))"),
    (
        "aten.elu_backward",
        "where(x > 0, grad * scale, grad * alpha * scale * exp(x * input_scale))",
    ),
    ("aten.cudnn_batch_norm", "aten.native_batch_norm"),
    ("aten.cudnn_batch_norm_backward", "aten.native_batch_norm_backward"),
    ("aten.masked_fill.Scalar", "where(mask, value, x)"),
    ("aten.masked_fill.Tensor", "where(mask, value, x)"),
    ("aten.elu", "where(x > 0, x * scale, alpha * scale * (exp(x * input_scale) - 1))"),
    ("aten.leaky_relu", "where(x > 0, x, x * slope)"),
    ("aten.hardtanh", "clamp(x, min, max)"),
    ("aten.hardswish", "x * clamp(x + 3, 0, 6) / 6"),
    ("aten.hardsigmoid", "clamp(x + 3, 0, 6) / 6"),
    ("aten.rsub", "other - alpha * x"),
    ("aten.native_batch_norm_backward", "reduce(grad, x, mean, invstd)"),
];

/// The rule set the fusion pipeline registers by default.
pub fn default_decompositions() -> DecompositionTable {
    let mut table = DecompositionTable::new();
    for (op, primitive) in DEFAULT_RULES {
        table.insert(*op, *primitive);
    }
    table
}
