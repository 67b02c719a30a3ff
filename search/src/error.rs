use cozy_chess::Move;
use thiserror::Error;
use utils::Terminal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The root position has no continuation.
    #[error("no legal moves: {0}")]
    NoLegalMoves(Terminal),

    /// The search produced a move the rules engine rejects.
    #[error("search produced an illegal move {from}{to}", from = .0.from, to = .0.to)]
    RulesViolation(Move),
}
