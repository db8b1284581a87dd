use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::{CallArgs, Forward, Signature, Value};

/// A named callable whose forward entry point can be swapped out.
pub struct Module {
    name: String,
    signature: Signature,
    forward: Arc<dyn Forward>,
    wrap_depth: usize,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        forward: impl Forward + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            signature,
            forward: Arc::new(forward),
            wrap_depth: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Current entry point, wrapped or not.
    pub fn entry_point(&self) -> Arc<dyn Forward> {
        Arc::clone(&self.forward)
    }

    /// Number of wrappers stacked on top of the original forward.
    pub fn wrap_depth(&self) -> usize {
        self.wrap_depth
    }

    /// Replaces the entry point with whatever `wrap` builds around the current one.
    /// Nothing stops a second wrap from stacking on the first.
    pub fn wrap_forward<F>(&mut self, wrap: F)
    where
        F: FnOnce(Arc<dyn Forward>, &Signature) -> Arc<dyn Forward>,
    {
        let current = Arc::clone(&self.forward);
        self.forward = wrap(current, &self.signature);
        self.wrap_depth += 1;
    }

    pub fn forward(&self, args: CallArgs) -> Result<Value> {
        self.forward.call(args)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("wrap_depth", &self.wrap_depth)
            .finish_non_exhaustive()
    }
}
