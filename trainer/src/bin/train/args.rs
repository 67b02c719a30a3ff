use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Both sides are the learning agent; TD(λ) updates.
    SelfPlay,
    /// Play a UCI reference engine; TD(λ) updates.
    Reference,
    /// Play a UCI reference engine and fit its evaluations.
    Supervised,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Quill Trainer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Improves Quill's learned evaluation weights by playing games")]
pub struct Args {
    /// Number of games to play, or to read with `--pgn`.
    #[arg(short, long, default_value_t = 1000)]
    pub games: usize,

    /// Learn from the recorded games of this PGN file instead of playing.
    #[arg(long)]
    pub pgn: Option<PathBuf>,

    /// Search depth of the learning agent.
    #[arg(short, long, default_value_t = 3)]
    pub depth: u8,

    /// Time budget per move in milliseconds, on top of the depth limit.
    #[arg(short, long)]
    pub movetime: Option<u64>,

    #[arg(long, value_enum, default_value_t = Mode::SelfPlay)]
    pub mode: Mode,

    /// Reference engine executable for `reference` and `supervised` modes.
    #[arg(long, default_value = "stockfish")]
    pub reference: PathBuf,

    /// Search depth of the reference engine's moves. Uses `--reference-movetime` when unset.
    #[arg(long)]
    pub reference_depth: Option<u8>,

    /// Reference engine time per move in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub reference_movetime: u64,

    /// Checkpoint directory. Training resumes from its newest valid checkpoint.
    #[arg(short, long, default_value = "checkpoints")]
    pub checkpoints: PathBuf,

    /// Games between checkpoints.
    #[arg(long, default_value_t = 50)]
    pub checkpoint_interval: usize,

    /// Self-play games played concurrently. Defaults to the number of CPUs.
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// TD(λ) trace decay.
    #[arg(long, default_value_t = 0.7)]
    pub lambda: f32,

    /// Optimizer learning rate.
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Games adjudicated drawn after this many plies.
    #[arg(long, default_value_t = 200)]
    pub max_plies: usize,

    /// Games against the material-only baseline at every checkpoint, a material
    /// lead of three pawns winning games cut off by `--max-plies`. 0 disables.
    #[arg(long, default_value_t = 10)]
    pub baseline_games: usize,

    /// Review a greedy self-play game with the reference engine at every checkpoint.
    #[arg(long)]
    pub analyze: bool,

    /// Append per-game metrics to this CSV file. Checkpoint evaluations go to
    /// the sibling `.evaluation.csv` file.
    #[arg(long)]
    pub metrics: Option<PathBuf>,

    /// Seed for reproducible games.
    #[arg(long)]
    pub seed: Option<u64>,
}
