use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use memfuse_core::{
    AotCompiler, AotRequest, CompilerBackend, Forward, GraphStage, HasherType, PartitionStrategy,
};
use tracing::trace;

/// Compiler backend that hands the graph back untouched.
pub struct EagerBackend;

impl EagerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EagerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerBackend for EagerBackend {
    fn name(&self) -> &'static str {
        "eager"
    }

    fn compile_graph(
        &self,
        graph: Arc<dyn Forward>,
        _stage: GraphStage,
    ) -> Result<Arc<dyn Forward>> {
        Ok(graph)
    }
}

/// Ahead-of-time pipeline without graph capture.
///
/// Both stages go through their compiler and backend errors come back as-is.
/// The partition strategy is only recorded; nothing is split.
#[derive(Default)]
pub struct EagerAot {
    compiles: AtomicU64,
    last: Mutex<Option<(PartitionStrategy, HasherType)>>,
}

impl EagerAot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile_count(&self) -> u64 {
        self.compiles.load(Ordering::Relaxed)
    }

    /// Partition strategy and hasher of the most recent request.
    pub fn last_request(&self) -> Option<(PartitionStrategy, HasherType)> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AotCompiler for EagerAot {
    fn name(&self) -> &'static str {
        "eager-aot"
    }

    fn compile(&self, forward: Arc<dyn Forward>, request: &AotRequest) -> Result<Arc<dyn Forward>> {
        self.compiles.fetch_add(1, Ordering::Relaxed);

        let fw = request
            .fw_compiler
            .compile_graph(Arc::clone(&forward), GraphStage::Forward)?;
        request
            .bw_compiler
            .compile_graph(forward, GraphStage::Backward)?;

        trace!(
            partition = %request.partition,
            hasher = %request.hasher,
            decompositions = request.decompositions.len(),
            "compiled forward"
        );

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((request.partition, request.hasher));

        Ok(fw)
    }
}
