mod main;
mod quiescence;
mod utils;

use cozy_chess::{Board, Move};
use evaluation::PieceValues;

use crate::history::HistoryHeuristic;

pub use main::MovePicker;
pub use quiescence::QMoveGenerator;
pub use self::utils::MAX_MOVES;

/// What the orderer knows about the node beyond the board itself.
pub struct OrderingContext<'a> {
    pub killers: [Option<Move>; 2],
    pub history: &'a HistoryHeuristic,
    pub phase: f32,
    pub piece_values: PieceValues,
}

/// All legal moves, most promising first. `hint` (typically the transposition
/// move) leads when it is legal.
pub fn order_moves(board: &Board, hint: Option<Move>, context: &OrderingContext) -> Vec<Move> {
    let mut picker = MovePicker::new(
        board,
        hint,
        context.killers,
        context.phase,
        context.piece_values,
        true,
    );
    let mut moves = Vec::new();
    while let Some(mv) = picker.next(board, context.history) {
        moves.push(mv);
    }
    moves
}
