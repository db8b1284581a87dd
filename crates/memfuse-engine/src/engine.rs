use std::sync::Arc;

use anyhow::Result;
use memfuse_core::{
    AotCompiler, AotRequest, CallArgs, CompilerBackend, Coordinator, Forward, Module, Standalone,
    Value,
};
use tracing::info;

use crate::{CompilationCache, CoordinatorLog, FusionDispatcher, FusionOptions};

/// Owns one module and installs the fused forward on it.
pub struct FusionEngine {
    module: Module,
    compiler: Arc<dyn AotCompiler>,
    fw_compiler: Arc<dyn CompilerBackend>,
    bw_compiler: Arc<dyn CompilerBackend>,
    options: FusionOptions,
    cache: Arc<CompilationCache>,
    coordinator: Arc<dyn Coordinator>,
}

impl FusionEngine {
    pub fn new(
        module: Module,
        compiler: Arc<dyn AotCompiler>,
        fw_compiler: Arc<dyn CompilerBackend>,
        bw_compiler: Arc<dyn CompilerBackend>,
    ) -> Self {
        Self {
            module,
            compiler,
            fw_compiler,
            bw_compiler,
            options: FusionOptions::default(),
            cache: Arc::new(CompilationCache::new()),
            coordinator: Arc::new(Standalone),
        }
    }

    pub fn with_options(mut self, options: FusionOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares a cache with other engines. Without this each engine has its own.
    pub fn with_cache(mut self, cache: Arc<CompilationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_coordinator(mut self, coordinator: impl Coordinator + 'static) -> Self {
        self.coordinator = Arc::new(coordinator);
        self
    }

    /// Wraps the module's current forward with a [`FusionDispatcher`].
    ///
    /// Not idempotent: a second call wraps the already-fused forward again,
    /// so every call then goes through two dispatch layers.
    pub fn fuse(&mut self) {
        let dispatch_request = self.request();
        let cache = Arc::clone(&self.cache);
        let log = CoordinatorLog::new(Arc::clone(&self.coordinator));
        let compiler = Arc::clone(&self.compiler);

        self.module.wrap_forward(|original, signature| {
            Arc::new(FusionDispatcher::new(
                original,
                signature.clone(),
                cache,
                log,
                compiler,
                dispatch_request,
            )) as Arc<dyn Forward>
        });

        info!(
            module = self.module.name(),
            params = self.module.signature().len(),
            depth = self.module.wrap_depth(),
            partition = %self.options.partition,
            "installed fused forward"
        );
    }

    pub fn forward(&self, args: CallArgs) -> Result<Value> {
        self.module.forward(args)
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    pub fn cache(&self) -> &Arc<CompilationCache> {
        &self.cache
    }

    pub fn options(&self) -> &FusionOptions {
        &self.options
    }

    fn request(&self) -> AotRequest {
        AotRequest {
            fw_compiler: Arc::clone(&self.fw_compiler),
            bw_compiler: Arc::clone(&self.bw_compiler),
            partition: self.options.partition,
            hasher: self.options.hasher,
            decompositions: Arc::clone(&self.options.decompositions),
        }
    }
}
