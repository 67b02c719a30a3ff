mod config;
pub mod engine;
mod error;
pub mod history;
pub mod move_ordering;
mod pruning;
mod stack;
mod time_control;
mod transposition;
mod utils;

/// Maximum search depth supported by the engine.
pub const MAX_DEPTH: usize = 100;

pub use config::{EngineConfig, OptionKind};
pub use engine::{Engine, SearchLimits, SearchResult};
pub use error::SearchError;
