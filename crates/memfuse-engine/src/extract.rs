use memfuse_core::{ShapeKey, ShapeStructure, Value};

/// Mirrors `value` with every tensor replaced by its [`ShapeKey`].
pub fn extract_shapes(value: &Value) -> ShapeStructure {
    match value {
        Value::Tensor(t) => ShapeStructure::Key(ShapeKey::of(t)),
        Value::Map(entries) => ShapeStructure::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), extract_shapes(v)))
                .collect(),
        ),
        Value::Seq(items) => ShapeStructure::Seq(items.iter().map(extract_shapes).collect()),
        Value::Scalar(s) => ShapeStructure::Scalar(s.clone()),
    }
}
