use cozy_chess::Move;
use search::SearchError;
use thiserror::Error;
use utils::Terminal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    /// Asked to move in a finished game.
    #[error("no legal moves: {0}")]
    NoLegalMoves(Terminal),

    #[error("engine chose an illegal move {from}{to}", from = .0.from, to = .0.to)]
    RulesViolation(Move),
}

impl From<SearchError> for AgentError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NoLegalMoves(terminal) => AgentError::NoLegalMoves(terminal),
            SearchError::RulesViolation(mv) => AgentError::RulesViolation(mv),
        }
    }
}
