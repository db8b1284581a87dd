use std::collections::BTreeMap;

use memfuse_core::{CallArgs, ShapeStructure, Signature, Tensor, Value};

use crate::extract_shapes;

/// Declared parameter name → tensor supplied for it in one call.
///
/// Non-tensor arguments never make it in here.
#[derive(Clone, Debug, Default)]
pub struct ParameterBinding {
    entries: BTreeMap<String, Tensor>,
}

impl ParameterBinding {
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn shape_structure(&self) -> ShapeStructure {
        extract_shapes(&self.to_value())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.entries
                .iter()
                .map(|(name, t)| (name.clone(), Value::Tensor(t.clone())))
                .collect(),
        )
    }

    /// Keyword-only arguments for the compiled function.
    pub fn into_call_args(self) -> CallArgs {
        CallArgs::keyword_only(self.entries)
    }
}

/// Reconciles `signature` against one call's arguments.
///
/// Keywords bind first. Positionals are then walked alongside the declared
/// parameters with one cursor: every declared parameter visited consumes a
/// positional slot, even if a keyword already bound it or the slot holds a
/// non-tensor. Nothing is reported for unmatched arguments.
pub fn bind_parameters(signature: &Signature, args: &CallArgs) -> ParameterBinding {
    let mut entries = BTreeMap::new();

    for name in signature.iter() {
        for (key, value) in &args.keyword {
            if key == name {
                if let Value::Tensor(t) = value {
                    entries.insert(name.to_string(), t.clone());
                }
            }
        }
    }

    let mut positional = args.positional.iter();
    for name in signature.iter() {
        let Some(value) = positional.next() else {
            break;
        };
        if entries.contains_key(name) {
            continue;
        }
        if let Value::Tensor(t) = value {
            entries.insert(name.to_string(), t.clone());
        }
    }

    ParameterBinding { entries }
}
