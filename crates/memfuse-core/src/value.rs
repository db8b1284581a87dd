use std::collections::BTreeMap;
use std::fmt;

use crate::Tensor;

/// Opaque non-tensor leaf of a call. Passes through shape extraction untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::None => f.write_str("None"),
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v:?}"),
            Scalar::Str(s) => write!(f, "'{s}'"),
        }
    }
}

/// Any value a forward call can receive or return.
#[derive(Clone, Debug)]
pub enum Value {
    Tensor(Tensor),
    Map(BTreeMap<String, Value>),
    Seq(Vec<Value>),
    Scalar(Scalar),
}

impl Value {
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Tensor(t)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(Scalar::Int(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Float(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

/// The positional and keyword arguments of one forward call.
#[derive(Clone, Debug, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    /// Keyword-only call built from name/tensor pairs.
    pub fn keyword_only<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Tensor)>,
    {
        Self {
            positional: Vec::new(),
            keyword: entries
                .into_iter()
                .map(|(name, t)| (name, Value::Tensor(t)))
                .collect(),
        }
    }

    /// Last keyword value supplied under `name`.
    pub fn get_kwarg(&self, name: &str) -> Option<&Value> {
        self.keyword
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Looks up a declared parameter the way a call site would resolve it:
    /// by keyword first, then by position.
    pub fn resolve(&self, name: &str, position: usize) -> Option<&Value> {
        self.get_kwarg(name).or_else(|| self.positional.get(position))
    }
}
