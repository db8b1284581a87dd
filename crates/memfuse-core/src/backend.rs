use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::{CallArgs, DecompositionTable, Value};

/// A forward entry point: the thing that gets wrapped, compiled and called.
pub trait Forward: Send + Sync {
    fn call(&self, args: CallArgs) -> Result<Value>;
}

impl<F> Forward for F
where
    F: Fn(CallArgs) -> Result<Value> + Send + Sync,
{
    fn call(&self, args: CallArgs) -> Result<Value> {
        self(args)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphStage {
    Forward,
    Backward,
}

/// Turns one partitioned subgraph into something executable.
pub trait CompilerBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn compile_graph(
        &self,
        graph: Arc<dyn Forward>,
        stage: GraphStage,
    ) -> Result<Arc<dyn Forward>>;
}

/// How the joint forward/backward graph is split before compilation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartitionStrategy {
    /// Save every intermediate the backward pass needs.
    Default,
    /// Recompute cheap intermediates in the backward pass instead of storing them.
    #[default]
    MinCutRematerialization,
}

impl FromStr for PartitionStrategy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "default" => Ok(Self::Default),
            "min-cut" | "min_cut" | "mincut" => Ok(Self::MinCutRematerialization),
            other => {
                bail!("unsupported partition strategy: {other} (expected default or min-cut)")
            }
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default_partition"),
            Self::MinCutRematerialization => f.write_str("min_cut_rematerialization_partition"),
        }
    }
}

/// How the compiler keys its own traced graphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HasherType {
    #[default]
    StaticShape,
    DynamicShape,
}

impl FromStr for HasherType {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "static" | "StaticShapeHasher" => Ok(Self::StaticShape),
            "dynamic" | "DynamicShapeHasher" => Ok(Self::DynamicShape),
            other => bail!("unsupported hasher type: {other} (expected static or dynamic)"),
        }
    }
}

impl fmt::Display for HasherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticShape => f.write_str("StaticShapeHasher"),
            Self::DynamicShape => f.write_str("DynamicShapeHasher"),
        }
    }
}

/// Everything an ahead-of-time compile needs besides the function itself.
#[derive(Clone)]
pub struct AotRequest {
    pub fw_compiler: Arc<dyn CompilerBackend>,
    pub bw_compiler: Arc<dyn CompilerBackend>,
    pub partition: PartitionStrategy,
    pub hasher: HasherType,
    pub decompositions: Arc<DecompositionTable>,
}

impl fmt::Debug for AotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AotRequest")
            .field("fw_compiler", &self.fw_compiler.name())
            .field("bw_compiler", &self.bw_compiler.name())
            .field("partition", &self.partition)
            .field("hasher", &self.hasher)
            .field("decompositions", &self.decompositions.len())
            .finish()
    }
}

pub trait AotCompiler: Send + Sync {
    fn name(&self) -> &'static str;
    fn compile(&self, forward: Arc<dyn Forward>, request: &AotRequest) -> Result<Arc<dyn Forward>>;
}
