use std::fmt;

use cozy_chess::{Board, Move};
use utils::{GameOutcome, Terminal};

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
    /// Ply cap reached, adjudicated as a draw
    MoveLimit,
    /// Result taken from a game database (resignation, time, agreement)
    Recorded,
}

impl From<Terminal> for Termination {
    fn from(terminal: Terminal) -> Self {
        match terminal {
            Terminal::Checkmate => Termination::Checkmate,
            Terminal::Stalemate => Termination::Stalemate,
            Terminal::FiftyMoveRule => Termination::FiftyMoveRule,
            Terminal::InsufficientMaterial => Termination::InsufficientMaterial,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::ThreefoldRepetition => "threefold repetition",
            Termination::FiftyMoveRule => "fifty-move rule",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::MoveLimit => "move limit",
            Termination::Recorded => "recorded result",
        };
        f.write_str(s)
    }
}

/// One move of a finished game.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPly {
    /// Position before the move
    pub board: Board,
    pub mv: Move,
    /// Search score of `board` from White's point of view, when the mover reported one
    pub eval: Option<i16>,
    /// Reference evaluation of `board`, White's point of view. Filled for supervised updates.
    pub reference_eval: Option<i16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub plies: Vec<RecordedPly>,
    pub final_board: Board,
    pub outcome: GameOutcome,
    pub termination: Termination,
}

impl GameRecord {
    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    /// Last search score reported in the game, White's point of view.
    pub fn final_eval(&self) -> i16 {
        self.plies.iter().rev().find_map(|p| p.eval).unwrap_or(0)
    }
}
