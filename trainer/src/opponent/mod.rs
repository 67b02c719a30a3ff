//! Stronger players the agent can learn from.

mod engine;
mod uci;

pub use engine::EngineOpponent;
pub use uci::{UciOpponent, UciOpponentConfig};

use cozy_chess::{Board, Move};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceMove {
    pub mv: Move,
    /// Opponent's score of the position, White's point of view, if it reported one
    pub white_eval: Option<i16>,
}

/// A reference player. Failures surface as `OpponentUnavailable`.
pub trait ReferenceOpponent: Send {
    fn name(&self) -> String;

    fn new_game(&mut self) -> Result<()> {
        Ok(())
    }

    fn request_move(&mut self, board: &Board) -> Result<ReferenceMove>;

    /// Evaluation of `board` in centipawns from White's point of view.
    fn request_evaluation(&mut self, board: &Board) -> Result<i16>;
}

/// Who the learning agent plays against.
pub enum OpponentSource {
    SelfPlay,
    VersusReference(Box<dyn ReferenceOpponent>),
}

impl OpponentSource {
    pub fn describe(&self) -> String {
        match self {
            OpponentSource::SelfPlay => "self-play".to_string(),
            OpponentSource::VersusReference(opponent) => format!("versus {}", opponent.name()),
        }
    }
}
