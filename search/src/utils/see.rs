use arrayvec::ArrayVec;
use cozy_chess::{Board, Move, Piece};
use evaluation::PieceValues;
use utils::{is_en_passant, make_move};

const MAX_EXCHANGES: usize = 32;

/// Static exchange evaluation: material balance of the capture sequence on the
/// destination square, each side recapturing with its least valuable piece and
/// free to stop when continuing would lose material.
///
/// <https://www.chessprogramming.org/Static_Exchange_Evaluation>
pub fn see(board: &Board, mv: Move, phase: f32, piece_values: &PieceValues) -> i16 {
    let target = mv.to;

    let victim = match board.piece_on(target) {
        Some(piece) if board.colors(!board.side_to_move()).has(target) => Some(piece),
        _ if is_en_passant(board, mv) => Some(Piece::Pawn),
        _ => None,
    };
    let Some(mover) = board.piece_on(mv.from) else {
        return 0;
    };

    // Value captured at each step of the exchange
    let mut gains: ArrayVec<i16, MAX_EXCHANGES> = ArrayVec::new();
    gains.push(victim.map_or(0, |p| piece_values.get(p, phase)) + promotion_gain(mv, phase, piece_values));

    let mut on_target = piece_values.get(mv.promotion.unwrap_or(mover), phase);
    let mut current = make_move(board, mv);

    while gains.len() < MAX_EXCHANGES {
        let Some(recapture) = least_valuable_recapture(&current, target) else {
            break;
        };
        let Some(piece) = current.piece_on(recapture.from) else {
            break;
        };

        gains.push(on_target + promotion_gain(recapture, phase, piece_values));
        on_target = piece_values.get(recapture.promotion.unwrap_or(piece), phase);
        current = make_move(&current, recapture);
    }

    // Each side may decline to continue the exchange, except the initial move
    let mut result = gains[gains.len() - 1];
    for gain in gains.iter().rev().skip(1) {
        result = gain - result.max(0);
    }
    result
}

fn promotion_gain(mv: Move, phase: f32, piece_values: &PieceValues) -> i16 {
    match mv.promotion {
        Some(promo) => piece_values.get(promo, phase) - piece_values.get(Piece::Pawn, phase),
        None => 0,
    }
}

fn least_valuable_recapture(board: &Board, target: cozy_chess::Square) -> Option<Move> {
    let mut best: Option<(usize, Move)> = None;
    board.generate_moves(|moves| {
        let mut captures = moves;
        captures.to &= target.bitboard();
        let rank = moves.piece as usize;
        for mv in captures {
            // Queen promotion stands in for all promotions
            if mv.promotion.is_some_and(|p| p != Piece::Queen) {
                continue;
            }
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((rank, mv));
            }
        }
        false
    });
    best.map(|(_, mv)| mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Square;

    fn see_of(fen: &str, from: Square, to: Square) -> i16 {
        let board: Board = fen.parse().unwrap();
        let mv = Move {
            from,
            to,
            promotion: None,
        };
        assert!(board.is_legal(mv));
        see(&board, mv, 1.0, &PieceValues::default())
    }

    #[test]
    fn free_pawn_wins_a_pawn() {
        let score = see_of("4k3/8/8/3p4/8/8/8/3RK3 w - - 0 1", Square::D1, Square::D5);
        assert_eq!(score, 100);
    }

    #[test]
    fn defended_pawn_loses_the_rook() {
        let score = see_of("4k3/2p5/3p4/8/8/8/8/3RK3 w - - 0 1", Square::D1, Square::D6);
        assert_eq!(score, 100 - 500);
    }

    #[test]
    fn pawn_takes_defended_knight() {
        let score = see_of("4k3/8/2p5/3n4/4P3/8/8/4K3 w - - 0 1", Square::E4, Square::D5);
        assert_eq!(score, 320 - 100);
    }
}
