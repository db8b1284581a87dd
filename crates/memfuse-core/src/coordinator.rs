use anyhow::{Context, Result};

/// Answers "is this a coordinated multi-process run, and are we rank zero?".
pub trait Coordinator: Send + Sync {
    fn is_available(&self) -> bool;
    fn is_coordinator(&self) -> bool;
}

/// Single process, no process group.
#[derive(Clone, Copy, Debug, Default)]
pub struct Standalone;

impl Coordinator for Standalone {
    fn is_available(&self) -> bool {
        false
    }

    fn is_coordinator(&self) -> bool {
        true
    }
}

/// Rank fixed at startup, typically by the launcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticRank {
    pub rank: usize,
    pub world_size: usize,
}

impl StaticRank {
    pub fn new(rank: usize, world_size: usize) -> Self {
        Self { rank, world_size }
    }

    /// Reads `RANK` and `WORLD_SIZE`. Missing variables mean a world of one.
    pub fn from_env() -> Result<Self> {
        let rank = env_var("RANK")?;
        let world_size = env_var("WORLD_SIZE")?;
        Self::parse(rank.as_deref(), world_size.as_deref())
    }

    /// Parses launcher-style rank values; `None` falls back to rank 0 of 1.
    pub fn parse(rank: Option<&str>, world_size: Option<&str>) -> Result<Self> {
        Ok(Self {
            rank: parse_usize("RANK", rank)?.unwrap_or(0),
            world_size: parse_usize("WORLD_SIZE", world_size)?.unwrap_or(1),
        })
    }
}

impl Coordinator for StaticRank {
    fn is_available(&self) -> bool {
        self.world_size > 1
    }

    fn is_coordinator(&self) -> bool {
        self.rank == 0
    }
}

fn parse_usize(key: &str, raw: Option<&str>) -> Result<Option<usize>> {
    raw.map(|raw| {
        raw.trim()
            .parse::<usize>()
            .with_context(|| format!("invalid {key}: {raw:?}"))
    })
    .transpose()
}

fn env_var(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(raw) => Ok(Some(raw)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("unreadable {key}")),
    }
}
