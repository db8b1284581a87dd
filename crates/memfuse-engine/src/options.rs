use std::sync::Arc;

use memfuse_core::{default_decompositions, DecompositionTable, HasherType, PartitionStrategy};

#[derive(Clone, Debug)]
pub struct FusionOptions {
    pub partition: PartitionStrategy,
    pub hasher: HasherType,
    pub decompositions: Arc<DecompositionTable>,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            partition: PartitionStrategy::MinCutRematerialization,
            hasher: HasherType::StaticShape,
            decompositions: Arc::new(default_decompositions()),
        }
    }
}

impl FusionOptions {
    pub fn with_partition(mut self, partition: PartitionStrategy) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_hasher(mut self, hasher: HasherType) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_decompositions(mut self, decompositions: DecompositionTable) -> Self {
        self.decompositions = Arc::new(decompositions);
        self
    }
}
