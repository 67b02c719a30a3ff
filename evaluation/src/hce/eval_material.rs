use cozy_chess::{Color, Piece};

use crate::hce::context::EvalContext;
use crate::params::EvaluatorParameters;

/// Tapered material plus piece-square placement for one side.
pub(super) fn evaluate(ctx: &EvalContext, color: Color, params: &EvaluatorParameters) -> i16 {
    let board = ctx.position.board;
    let mut cp = 0i16;

    for piece in Piece::ALL {
        let squares = board.colored_pieces(color, piece);
        if squares.is_empty() {
            continue;
        }
        cp += params.piece_values.get(piece, ctx.phase) * squares.len() as i16;
        cp += params
            .pst
            .sum(squares, piece, color, ctx.phase, ctx.inv_phase);
    }

    cp
}
