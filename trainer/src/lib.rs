//! Self-play, reference-guided and recorded-game training of the evaluator's learned weights.

pub mod analysis;
pub mod arena;
pub mod config;
pub mod database;
mod error;
pub mod game;
pub mod metrics;
pub mod opponent;
mod trainer;
pub mod update;

pub use analysis::{analyze_game, GameAnalysis};
pub use arena::{play_match, MatchConfig, MatchScore};
pub use config::{
    EvaluationConfig, ExplorationConfig, OpponentFailurePolicy, OptimizerConfig, TrainerConfig,
    UpdateRule,
};
pub use database::{load_pgn, parse_pgn};
pub use error::{Result, TrainingError};
pub use metrics::{
    CsvSink, EvaluationMetrics, GameMetrics, LogSink, MetricsSink, MultiSink, UpdateStatus,
};
pub use opponent::{
    EngineOpponent, OpponentSource, ReferenceMove, ReferenceOpponent, UciOpponent,
    UciOpponentConfig,
};
pub use trainer::{Trainer, TrainingSummary};
