use cozy_chess::{Board, Move, Piece};
use evaluation::PieceValues;
use utils::is_capture;

/// Upper bound on legal moves in any chess position.
pub const MAX_MOVES: usize = 256;

pub(super) struct ScoredMove {
    pub mov: Move,
    pub score: i32,
}

/// Index of the highest score; ties go to the earliest entry.
pub(super) fn select_highest(array: &[ScoredMove]) -> Option<usize> {
    if array.is_empty() {
        return None;
    }
    let mut best_score = array[0].score;
    let mut best_index = 0;
    for (index, mv) in array.iter().enumerate().skip(1) {
        if mv.score > best_score {
            best_score = mv.score;
            best_index = index;
        }
    }
    Some(best_index)
}

/// Most valuable victim, least valuable attacker.
#[inline(always)]
pub(super) fn mvv_lva(board: &Board, mv: Move) -> i32 {
    // En passant has no piece on the destination square
    let victim = if is_capture(board, mv) {
        board.piece_on(mv.to).unwrap_or(Piece::Pawn)
    } else {
        Piece::Pawn
    };
    let attacker = board.piece_on(mv.from).unwrap_or(Piece::Pawn);
    victim as i32 * 8 - attacker as i32
}

#[inline(always)]
pub(super) fn victim_value(board: &Board, mv: Move, phase: f32, piece_values: &PieceValues) -> i16 {
    let victim = if is_capture(board, mv) {
        board.piece_on(mv.to).unwrap_or(Piece::Pawn)
    } else {
        Piece::Pawn
    };
    piece_values.get(victim, phase)
}
