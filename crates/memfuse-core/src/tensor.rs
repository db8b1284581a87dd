use std::fmt;

use anyhow::{ensure, Result};
use bytes::Bytes;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F16,
    BF16,
    F64,
    I64,
    I32,
    U8,
    Bool,
}

impl DType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::F64 | DType::I64 => 8,
            DType::F32 | DType::I32 => 4,
            DType::F16 | DType::BF16 => 2,
            DType::U8 | DType::Bool => 1,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "float32",
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::F64 => "float64",
            DType::I64 => "int64",
            DType::I32 => "int32",
            DType::U8 => "uint8",
            DType::Bool => "bool",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

#[derive(Clone, Debug)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
    pub strides: Option<SmallVec<[isize; 6]>>,
    pub requires_grad: bool,
}

/// Host tensor: a descriptor plus little-endian element bytes.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub data: Bytes,
}

impl Tensor {
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            desc: TensorDesc {
                dtype,
                shape,
                strides: None,
                requires_grad: false,
            },
            data: bytes,
        }
    }

    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        let len = shape.numel() * dtype.size_in_bytes();
        Self::from_cpu_bytes(dtype, shape, Bytes::from(vec![0u8; len]))
    }

    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.desc.requires_grad = requires_grad;
        self
    }

    /// Overrides the memory layout. Strides are in elements, one per dimension.
    pub fn with_strides(mut self, strides: &[isize]) -> Result<Self> {
        ensure!(
            strides.len() == self.desc.shape.rank(),
            "expected {} strides, got {}",
            self.desc.shape.rank(),
            strides.len()
        );
        self.desc.strides = Some(strides.iter().copied().collect());
        Ok(self)
    }

    pub fn dtype(&self) -> DType {
        self.desc.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.desc.shape
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}
