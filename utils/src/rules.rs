//! The capability set the engine consumes from the rules engine:
//! legal move generation, move application, terminal detection and hashing.

use cozy_chess::{Board, Color, GameStatus, Move};
use std::fmt;

use crate::material::has_insufficient_material;
use crate::moves::{collect_legal_moves, has_legal_moves, make_move};

/// Why a position has no continuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// The side to move is mated.
    Checkmate,
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl Terminal {
    /// Final result, given the side that would move in the terminal position.
    pub fn outcome(self, side_to_move: Color) -> GameOutcome {
        match self {
            Terminal::Checkmate => GameOutcome::win_for(!side_to_move),
            _ => GameOutcome::Draw,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Terminal::Checkmate => "checkmate",
            Terminal::Stalemate => "stalemate",
            Terminal::FiftyMoveRule => "fifty-move rule",
            Terminal::InsufficientMaterial => "insufficient material",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameOutcome {
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameOutcome::WhiteWins,
            Color::Black => GameOutcome::BlackWins,
        }
    }

    /// +1 for a White win, -1 for a Black win, 0 for a draw.
    pub fn white_score(self) -> f32 {
        match self {
            GameOutcome::WhiteWins => 1.0,
            GameOutcome::BlackWins => -1.0,
            GameOutcome::Draw => 0.0,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameOutcome::WhiteWins => "1-0",
            GameOutcome::BlackWins => "0-1",
            GameOutcome::Draw => "1/2-1/2",
        };
        f.write_str(s)
    }
}

#[inline(always)]
pub fn legal_moves(board: &Board) -> Vec<Move> {
    collect_legal_moves(board)
}

#[inline(always)]
pub fn apply(board: &Board, mv: Move) -> Board {
    make_move(board, mv)
}

#[inline(always)]
pub fn is_legal(board: &Board, mv: Move) -> bool {
    board.is_legal(mv)
}

#[inline(always)]
pub fn hash(board: &Board) -> u64 {
    board.hash()
}

/// Returns the terminal condition of the position, if any.
/// Repetition is history dependent and left to the caller.
pub fn terminal(board: &Board) -> Option<Terminal> {
    match board.status() {
        GameStatus::Won => Some(Terminal::Checkmate),
        GameStatus::Drawn if has_legal_moves(board) => Some(Terminal::FiftyMoveRule),
        GameStatus::Drawn => Some(Terminal::Stalemate),
        GameStatus::Ongoing if has_insufficient_material(board) => {
            Some(Terminal::InsufficientMaterial)
        }
        GameStatus::Ongoing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_not_terminal() {
        assert_eq!(terminal(&Board::default()), None);
        assert_eq!(legal_moves(&Board::default()).len(), 20);
    }

    #[test]
    fn detects_checkmate() {
        // Fool's mate
        let board: Board = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"
            .parse()
            .unwrap();
        assert_eq!(terminal(&board), Some(Terminal::Checkmate));
        assert_eq!(
            Terminal::Checkmate.outcome(board.side_to_move()),
            GameOutcome::BlackWins
        );
    }

    #[test]
    fn detects_stalemate() {
        let board: Board = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1".parse().unwrap();
        assert_eq!(terminal(&board), Some(Terminal::Stalemate));
    }

    #[test]
    fn detects_fifty_move_rule() {
        let board: Board = "7k/8/8/8/8/8/R7/K7 w - - 100 80".parse().unwrap();
        assert_eq!(terminal(&board), Some(Terminal::FiftyMoveRule));
    }

    #[test]
    fn detects_insufficient_material() {
        let board: Board = "7k/8/8/8/8/8/8/KN6 w - - 0 1".parse().unwrap();
        assert_eq!(terminal(&board), Some(Terminal::InsufficientMaterial));
    }
}
