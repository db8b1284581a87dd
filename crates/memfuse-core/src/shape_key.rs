use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use crate::{DType, Scalar, Tensor};

/// Dimensions and element type of a tensor, detached from the tensor itself.
///
/// Layout and autograd flags are deliberately absent: two tensors with the
/// same dims and dtype always produce equal keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    dims: SmallVec<[usize; 6]>,
    dtype: DType,
}

impl ShapeKey {
    pub fn new(dims: &[usize], dtype: DType) -> Self {
        Self {
            dims: dims.iter().copied().collect(),
            dtype,
        }
    }

    pub fn of(tensor: &Tensor) -> Self {
        Self::new(tensor.shape().dims(), tensor.dtype())
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Size(")?;
        match self.dims.as_slice() {
            [] => {}
            [only] => write!(f, "{only},")?,
            dims => {
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{d}")?;
                }
            }
        }
        f.write_str(")")
    }
}

/// A call's arguments with every tensor replaced by its [`ShapeKey`].
///
/// Equality is structural all the way down; map equality ignores insertion order.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeStructure {
    Key(ShapeKey),
    Map(BTreeMap<String, ShapeStructure>),
    Seq(Vec<ShapeStructure>),
    Scalar(Scalar),
}

impl fmt::Display for ShapeStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeStructure::Key(key) => write!(f, "{key}"),
            ShapeStructure::Scalar(s) => write!(f, "{s}"),
            ShapeStructure::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ShapeStructure::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{k}': {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
