use cozy_chess::{Board, Color};

/// Converts a score between White's point of view and the side to move's.
/// Applying it twice is the identity.
#[inline(always)]
pub fn flip_eval_perspective(board: &Board, score: i16) -> i16 {
    match board.side_to_move() {
        Color::White => score,
        Color::Black => -score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_to_move_negates() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        assert_eq!(flip_eval_perspective(&board, 120), -120);
        assert_eq!(flip_eval_perspective(&Board::default(), 120), 120);
    }
}
