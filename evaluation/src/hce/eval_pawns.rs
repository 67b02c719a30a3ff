use arrayvec::ArrayVec;
use cozy_chess::{BitBoard, Board, Color, File, Piece, Square};

use crate::params::TermWeights;

pub(super) fn evaluate(board: &Board, color: Color, phase: f32, terms: &TermWeights) -> i16 {
    let my_pawns = board.colored_pieces(color, Piece::Pawn);
    if my_pawns.is_empty() {
        return 0;
    }
    let enemy_pawns = board.colored_pieces(!color, Piece::Pawn);
    let mut score = 0i16;

    for file in File::ALL {
        let on_file = (my_pawns & file.bitboard()).len();
        if on_file == 0 {
            continue;
        }
        score -= match on_file {
            1 => 0,
            2 => terms.doubled_pawn_penalty,
            _ => terms.tripled_pawn_penalty,
        };
        if (my_pawns & file.adjacent()).is_empty() {
            score -= terms.isolated_pawn_penalty;
        }
    }

    // Most advanced passer gets the full bonus, the next half, then a third...
    let mut bonuses = ArrayVec::<i16, 8>::new();
    for sq in passed_pawns(my_pawns, enemy_pawns, color) {
        let effective_rank = sq.rank().relative_to(color) as i16 - 1;
        if effective_rank > 0 {
            bonuses.push(
                terms.passed_pawn_linear * effective_rank
                    + terms.passed_pawn_quadratic * effective_rank * effective_rank,
            );
        }
    }
    bonuses.sort_unstable_by(|a, b| b.cmp(a));
    for (idx, bonus) in bonuses.iter().enumerate() {
        score += bonus / (idx as i16 + 1);
    }

    for sq in my_pawns {
        if is_backward_pawn(sq, color, my_pawns) {
            score -= terms.backward_pawn_penalty;
            if (enemy_pawns & sq.file().bitboard()).is_empty() {
                score -= terms.backward_pawn_half_open_penalty;
            }
        }
    }

    if !(my_pawns & File::D.bitboard()).is_empty() && !(my_pawns & File::E.bitboard()).is_empty() {
        score += ((terms.center_pawn_bonus as f32) * phase).round() as i16;
    }

    score
}

/// Pawns with no enemy pawn ahead on their own or adjacent files.
#[inline(always)]
pub(crate) fn passed_pawns(my_pawns: BitBoard, enemy_pawns: BitBoard, color: Color) -> BitBoard {
    let mut passed = BitBoard::EMPTY;
    for sq in my_pawns {
        if (enemy_pawns & PASSED_PAWN_MASKS[color as usize][sq as usize]).is_empty() {
            passed |= sq.bitboard();
        }
    }
    passed
}

/// Extra pawns stacked on a file plus isolated pawns.
#[inline(always)]
pub(crate) fn weak_pawns(my_pawns: BitBoard) -> u32 {
    let mut weak = 0;
    for file in File::ALL {
        let on_file = (my_pawns & file.bitboard()).len();
        if on_file == 0 {
            continue;
        }
        weak += on_file - 1;
        if (my_pawns & file.adjacent()).is_empty() {
            weak += on_file;
        }
    }
    weak
}

// A pawn is backward when every friendly pawn on the adjacent files is ahead of it,
// so none can ever defend it.
// <https://www.chessprogramming.org/Backward_Pawn>
fn is_backward_pawn(sq: Square, color: Color, my_pawns: BitBoard) -> bool {
    let neighbours = my_pawns & sq.file().adjacent();
    if neighbours.is_empty() {
        // isolated, scored separately
        return false;
    }

    let rank = sq.rank().relative_to(color) as usize;
    if neighbours
        .into_iter()
        .any(|n| n.rank().relative_to(color) as usize <= rank)
    {
        return false;
    }

    // a pawn on the last rank has no stop square
    rank < 7
}

/// Pre-computed passed-pawn masks: [color][square].
const PASSED_PAWN_MASKS: [[BitBoard; 64]; 2] = {
    let mut table = [[BitBoard::EMPTY; 64]; 2];
    let mut square_idx = 0;
    while square_idx < 64 {
        let file_idx = (square_idx % 8) as i8;
        let rank_idx = (square_idx / 8) as i8;

        table[Color::White as usize][square_idx] =
            BitBoard(make_passed_pawn_mask(rank_idx, file_idx, 1));
        table[Color::Black as usize][square_idx] =
            BitBoard(make_passed_pawn_mask(rank_idx, file_idx, -1));

        square_idx += 1;
    }
    table
};

/// Every square ahead of the pawn on its own and adjacent files.
const fn make_passed_pawn_mask(mut rank_idx: i8, file_idx: i8, step: i8) -> u64 {
    let mut mask = 0u64;
    rank_idx += step;
    while rank_idx >= 0 && rank_idx < 8 {
        let mut scan_file = file_idx - 1;
        while scan_file <= file_idx + 1 {
            if scan_file >= 0 && scan_file < 8 {
                mask |= 1u64 << ((rank_idx as u64) * 8 + scan_file as u64);
            }
            scan_file += 1;
        }
        rank_idx += step;
    }
    mask
}
