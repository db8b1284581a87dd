use std::sync::Arc;

use anyhow::Result;
use memfuse_core::{AotCompiler, AotRequest, CallArgs, Forward, Signature, Value};
use tracing::debug;

use crate::{bind_parameters, CompilationCache, CoordinatorLog};

/// The wrapped forward installed by [`crate::FusionEngine::fuse`].
///
/// Per call: bind, derive the shape structure, note novelty, compile the
/// original forward, run it on the bound tensors. The compile request is
/// issued on every call; only the log line is deduplicated.
pub struct FusionDispatcher {
    original: Arc<dyn Forward>,
    signature: Signature,
    cache: Arc<CompilationCache>,
    log: CoordinatorLog,
    compiler: Arc<dyn AotCompiler>,
    request: AotRequest,
}

impl FusionDispatcher {
    pub fn new(
        original: Arc<dyn Forward>,
        signature: Signature,
        cache: Arc<CompilationCache>,
        log: CoordinatorLog,
        compiler: Arc<dyn AotCompiler>,
        request: AotRequest,
    ) -> Self {
        Self {
            original,
            signature,
            cache,
            log,
            compiler,
            request,
        }
    }
}

impl Forward for FusionDispatcher {
    fn call(&self, args: CallArgs) -> Result<Value> {
        let binding = bind_parameters(&self.signature, &args);
        let shape = binding.shape_structure();

        let novel = self.cache.observe(&shape);
        if novel {
            self.log.compiling_new_graph(&shape);
        }
        debug!(
            compiler = self.compiler.name(),
            tensors = binding.len(),
            novel,
            "dispatching fused forward"
        );

        let compiled = self
            .compiler
            .compile(Arc::clone(&self.original), &self.request)?;
        compiled.call(binding.into_call_args())
    }
}
