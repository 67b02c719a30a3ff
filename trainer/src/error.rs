use evaluation::CheckpointError;
use quill::AgentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainingError {
    /// The reference opponent could not be reached or answered nonsense.
    #[error("reference opponent unavailable: {0}")]
    OpponentUnavailable(String),

    #[error("checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// The update produced non-finite or oversized weights and was thrown away.
    #[error("divergent update rejected (max |w| = {max_abs})")]
    DivergentUpdate { max_abs: f32 },

    #[error("tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("agent failed: {0}")]
    Agent(#[from] AgentError),

    #[error("invalid training configuration: {0}")]
    Config(String),

    #[error("failed to read game database: {0}")]
    Database(#[from] std::io::Error),
}

impl TrainingError {
    pub(crate) fn unavailable(reason: impl ToString) -> Self {
        TrainingError::OpponentUnavailable(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrainingError>;
