use std::sync::Arc;

use memfuse_core::{Coordinator, ShapeStructure};
use tracing::warn;

/// Emits shared diagnostics from the coordinating process only.
#[derive(Clone)]
pub struct CoordinatorLog {
    coordinator: Arc<dyn Coordinator>,
}

impl CoordinatorLog {
    pub fn new(coordinator: Arc<dyn Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Uncoordinated runs always emit; coordinated runs emit on rank zero.
    pub fn should_emit(&self) -> bool {
        !self.coordinator.is_available() || self.coordinator.is_coordinator()
    }

    pub fn compiling_new_graph(&self, shape: &ShapeStructure) {
        if self.should_emit() {
            warn!("[MemoryEfficientFusion] Compiling new graph for {shape}.");
        }
    }
}
