use cozy_chess::{get_bishop_moves, get_knight_moves, get_rook_moves, Color, Piece, Rank};

use crate::hce::context::EvalContext;
use crate::params::TermWeights;

/// Mobility for minor and major pieces, rook file/rank bonuses and the bishop pair.
pub(super) fn evaluate(ctx: &EvalContext, color: Color, terms: &TermWeights) -> i16 {
    let board = ctx.position.board;
    let occupied = board.occupied();
    let mine = board.colors(color);
    let mut cp = 0i16;

    // Knight and queen mobility matter most while the board is crowded.
    let mut crowded = 0i16;
    for sq in board.colored_pieces(color, Piece::Knight) {
        crowded += terms.knight_mobility * (get_knight_moves(sq) & !mine).len() as i16;
    }
    for sq in board.colored_pieces(color, Piece::Queen) {
        let moves = get_bishop_moves(sq, occupied) | get_rook_moves(sq, occupied);
        crowded += terms.queen_mobility * (moves & !mine).len() as i16;
    }
    cp += (crowded as f32 * ctx.phase).round() as i16;

    let bishops = board.colored_pieces(color, Piece::Bishop);
    for sq in bishops {
        cp += terms.bishop_mobility * (get_bishop_moves(sq, occupied) & !mine).len() as i16;
    }
    if bishops.len() >= 2 {
        cp += terms.bishop_pair_bonus;
    }

    let our_pawns = board.colored_pieces(color, Piece::Pawn);
    let their_pawns = board.colored_pieces(!color, Piece::Pawn);
    for sq in board.colored_pieces(color, Piece::Rook) {
        cp += terms.rook_mobility * (get_rook_moves(sq, occupied) & !mine).len() as i16;

        let file = sq.file().bitboard();
        cp += match (
            (our_pawns & file).is_empty(),
            (their_pawns & file).is_empty(),
        ) {
            (true, true) => terms.rook_open_file_bonus,
            (true, false) => terms.rook_semi_open_file_bonus,
            _ => 0,
        };

        if sq.rank().relative_to(color) == Rank::Seventh {
            cp += terms.rook_seventh_rank_bonus;
        }
    }

    cp
}
