use cozy_chess::{BitBoard, Board, Color, Piece, Rank, Square};

use crate::hce::context::EvalContext;
use crate::params::TermWeights;

// Middlegame terms (shield, files, pressure, central king) fade with the phase;
// king activity only kicks in for the endgame.
pub(super) fn evaluate(ctx: &EvalContext, color: Color, terms: &TermWeights) -> i16 {
    let board = ctx.position.board;
    let phase = ctx.phase;

    let (r1, r2) = shield_pawns(board, color);
    let mut middlegame = (r1 as i16) * terms.king_shield_r1_bonus
        + (r2 as i16) * terms.king_shield_r2_bonus;
    middlegame -= file_exposure(board, color, terms);
    middlegame -= ctx.position.king_zone_attacks_for(!color) * terms.king_pressure;
    middlegame -= central_king(board.king(color), color, terms);

    let mut cp = (middlegame as f32 * phase).round() as i16;
    if phase < 0.4 {
        cp += endgame_activity(board.king(color), phase, terms);
    }
    cp
}

/// Own pawns directly in front of the king, one and two ranks ahead.
pub(crate) fn shield_pawns(board: &Board, color: Color) -> (u32, u32) {
    let pawns = board.colored_pieces(color, Piece::Pawn);
    let window = files_window(board.king(color));
    let r1 = Rank::Second.relative_to(color).bitboard();
    let r2 = Rank::Third.relative_to(color).bitboard();
    ((pawns & window & r1).len(), (pawns & window & r2).len())
}

fn file_exposure(board: &Board, color: Color, terms: &TermWeights) -> i16 {
    let window = files_window(board.king(color));
    let ours = (board.colored_pieces(color, Piece::Pawn) & window).len();
    let theirs = (board.colored_pieces(!color, Piece::Pawn) & window).len();
    match (ours, theirs) {
        (0, 0) => terms.king_open_file_penalty,
        (0, _) => terms.king_semi_open_file_penalty,
        (1, _) => terms.king_thin_cover_penalty,
        _ => 0,
    }
}

// King still on c-f files of its first two ranks.
fn central_king(king: Square, color: Color, terms: &TermWeights) -> i16 {
    let file = king.file() as i32;
    let rank = king.rank().relative_to(color) as i32;
    if (2..=5).contains(&file) && rank <= 1 {
        terms.king_central_penalty
    } else {
        0
    }
}

// Full bonus on the four center squares, nothing in the corners (distance 6).
fn endgame_activity(king: Square, phase: f32, terms: &TermWeights) -> i16 {
    let file = king.file() as i32;
    let rank = king.rank() as i32;
    let d = [(3, 3), (4, 3), (3, 4), (4, 4)]
        .iter()
        .map(|(f, r)| (file - f).abs() + (rank - r).abs())
        .min()
        .unwrap_or(0);
    (terms.king_activity_bonus as f32 * (1.0 - d as f32 / 6.0) * 2.0 * (1.0 - phase)).round() as i16
}

#[inline(always)]
fn files_window(king: Square) -> BitBoard {
    let file = king.file();
    file.bitboard() | file.adjacent()
}
