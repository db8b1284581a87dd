use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "memfuse", version, about = "Shape-keyed fused forward dispatcher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fuse the demo module and drive it with a shape schedule
    Run {
        /// Calls separated by `;`, tensors by `,`, dims by `x`
        #[arg(long, default_value = "4x4,4x4;4x4,4x4;8x8,8x8")]
        shapes: String,

        /// How many times to replay the schedule
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Scalar passed positionally as `alpha`
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,

        /// Partition strategy (default or min-cut)
        #[arg(long, default_value = "min-cut")]
        partition: String,

        /// Compiler shape hasher (static or dynamic)
        #[arg(long, default_value = "static")]
        hasher: String,

        /// Process rank; falls back to RANK
        #[arg(long)]
        rank: Option<usize>,

        /// Process count; falls back to WORLD_SIZE
        #[arg(long)]
        world_size: Option<usize>,

        /// Log level (RUST_LOG)
        #[arg(long, default_value = "info")]
        log: String,
    },
    /// Print the shape structure of each call in a schedule without compiling
    Shapes {
        #[arg(long)]
        shapes: String,
    },
}
