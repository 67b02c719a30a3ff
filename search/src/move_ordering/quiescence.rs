// Move ordering for quiescence search

use arrayvec::ArrayVec;
use cozy_chess::{Board, Move};
use evaluation::PieceValues;
use utils::takes_piece;

use super::utils::{mvv_lva, select_highest, victim_value, ScoredMove, MAX_MOVES};

pub struct QMoveGenerator {
    forcing_moves: ArrayVec<ScoredMove, MAX_MOVES>,
    ordered: bool,
    cursor: usize,
}

impl QMoveGenerator {
    /// Captures when not in check, every legal evasion when in check.
    /// A promotion counts only when it captures.
    pub fn new(
        in_check: bool,
        board: &Board,
        phase: f32,
        piece_values: &PieceValues,
        ordered: bool,
    ) -> Self {
        let mut forcing_moves = ArrayVec::new();

        board.generate_moves(|moves| {
            for mov in moves {
                if !in_check && !takes_piece(board, mov) {
                    continue;
                }
                let score = if !ordered {
                    0
                } else if in_check {
                    // King first, then the cheapest blocker or capturer
                    match board.piece_on(mov.from) {
                        Some(piece) if piece != cozy_chess::Piece::King => {
                            -(piece_values.get(piece, phase) as i32)
                        }
                        _ => 0,
                    }
                } else {
                    // MVV-LVA
                    victim_value(board, mov, phase, piece_values) as i32 * 16
                        + mvv_lva(board, mov)
                };
                if forcing_moves.try_push(ScoredMove { mov, score }).is_err() {
                    return true;
                }
            }
            false
        });

        Self {
            forcing_moves,
            ordered,
            cursor: 0,
        }
    }

    pub fn next(&mut self) -> Option<Move> {
        if !self.ordered {
            let scored = self.forcing_moves.get(self.cursor)?;
            self.cursor += 1;
            return Some(scored.mov);
        }
        let index = select_highest(&self.forcing_moves)?;
        Some(self.forcing_moves.swap_remove(index).mov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::{Piece, Square};

    fn drain(mut generator: QMoveGenerator) -> Vec<Move> {
        let mut moves = Vec::new();
        while let Some(mv) = generator.next() {
            moves.push(mv);
        }
        moves
    }

    #[test]
    fn only_captures_when_not_in_check() {
        let board: Board = "4k3/8/8/3pP3/8/2n5/8/R3K3 w - d6 0 2".parse().unwrap();
        let moves = drain(QMoveGenerator::new(
            false,
            &board,
            1.0,
            &PieceValues::default(),
            true,
        ));
        // exd6 e.p. is the only capture; the knight on c3 is out of reach
        assert_eq!(
            moves,
            vec![Move {
                from: Square::E5,
                to: Square::D6,
                promotion: None
            }]
        );
    }

    #[test]
    fn quiet_promotions_are_not_forcing() {
        let quiet: Board = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let moves = drain(QMoveGenerator::new(
            false,
            &quiet,
            0.0,
            &PieceValues::default(),
            true,
        ));
        assert!(moves.is_empty());

        let capturing: Board = "1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let moves = drain(QMoveGenerator::new(
            false,
            &capturing,
            0.0,
            &PieceValues::default(),
            true,
        ));
        assert_eq!(moves.len(), 4);
        assert!(moves
            .iter()
            .all(|mv| mv.to == Square::B8 && mv.promotion.is_some()));
    }

    #[test]
    fn most_valuable_victim_first() {
        let board: Board = "4k3/8/8/2q1p3/3P4/8/8/4K3 w - - 0 1".parse().unwrap();
        let moves = drain(QMoveGenerator::new(
            false,
            &board,
            1.0,
            &PieceValues::default(),
            true,
        ));
        assert_eq!(moves.len(), 2);
        assert_eq!(board.piece_on(moves[0].to), Some(Piece::Queen));
    }

    #[test]
    fn all_evasions_in_check() {
        let board: Board = "4k3/8/8/8/8/8/3q4/R3K3 w - - 0 1".parse().unwrap();
        let moves = drain(QMoveGenerator::new(
            true,
            &board,
            1.0,
            &PieceValues::default(),
            true,
        ));
        let mut legal = utils::collect_legal_moves(&board);
        assert_eq!(moves.len(), legal.len());
        legal.retain(|m| !moves.contains(m));
        assert!(legal.is_empty());
    }
}
