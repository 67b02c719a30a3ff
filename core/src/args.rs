use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "Quill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prints the move Quill would play in a position")]
pub struct Args {
    /// Position to search, as FEN. Defaults to the start position.
    #[arg(long)]
    pub fen: Option<String>,

    /// Maximum search depth in plies.
    #[arg(short, long)]
    pub depth: Option<u8>,

    /// Time budget in milliseconds.
    #[arg(short, long)]
    pub movetime: Option<u64>,

    /// Choose randomly among this many near-best moves.
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Centipawn margin for moves counted as near-best.
    #[arg(long, default_value_t = 20)]
    pub margin: i16,

    /// Checkpoint directory to load evaluator parameters from.
    #[arg(short, long)]
    pub checkpoints: Option<PathBuf>,

    /// Engine option override, e.g. `--option hash_size=64`. Repeatable.
    #[arg(short, long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Write debug logs to a file.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Log search progress to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}
