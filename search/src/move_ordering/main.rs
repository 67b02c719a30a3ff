// Staged move picker for the main search

use arrayvec::ArrayVec;
use cozy_chess::{Board, Move};
use evaluation::PieceValues;
use utils::{gives_check, takes_piece};

use super::utils::{mvv_lva, select_highest, ScoredMove, MAX_MOVES};
use crate::history::HistoryHeuristic;
use crate::utils::see::see;

// Score tiers, highest first
const GOOD_CAPTURE: i32 = 5_000_000;
const BAD_CAPTURE: i32 = 4_000_000;
const QUIET_CHECK: i32 = 3_000_000;
const QUIET_PROMOTION: i32 = 2_000_000;
const KILLER: i32 = 1_000_000;

#[derive(PartialEq, Eq, Clone, Copy)]
enum Phase {
    BestMove,
    Generate,
    Scored,
    Done,
}

/// Yields every legal move once: the transposition move (if legal), then captures
/// by exchange gain with losing captures last, quiet checks, quiet promotions,
/// killers and finally quiets by history. With ordering disabled the moves come
/// out in generation order.
pub struct MovePicker {
    phase: Phase,
    game_phase: f32,
    best_move: Option<Move>,
    killer_moves: [Option<Move>; 2],
    moves: ArrayVec<ScoredMove, MAX_MOVES>,
    piece_values: PieceValues,
    ordered: bool,
    cursor: usize,
}

impl MovePicker {
    pub fn new(
        board: &Board,
        best_move: Option<Move>,
        killer_moves: [Option<Move>; 2],
        game_phase: f32,
        piece_values: PieceValues,
        ordered: bool,
    ) -> Self {
        let best_move = best_move.filter(|mv| ordered && board.is_legal(*mv));
        Self {
            phase: Phase::BestMove,
            game_phase,
            best_move,
            killer_moves,
            moves: ArrayVec::new(),
            piece_values,
            ordered,
            cursor: 0,
        }
    }

    pub fn next(&mut self, board: &Board, history: &HistoryHeuristic) -> Option<Move> {
        if self.phase == Phase::BestMove {
            self.phase = Phase::Generate;
            if let Some(best_move) = self.best_move {
                return Some(best_move);
            }
        }

        if self.phase == Phase::Generate {
            self.phase = Phase::Scored;
            self.generate(board, history);
        }

        if self.phase == Phase::Scored {
            if !self.ordered {
                if let Some(scored) = self.moves.get(self.cursor) {
                    self.cursor += 1;
                    return Some(scored.mov);
                }
            } else if let Some(index) = select_highest(&self.moves) {
                return Some(self.moves.swap_remove(index).mov);
            }
            self.phase = Phase::Done;
        }

        None
    }

    fn generate(&mut self, board: &Board, history: &HistoryHeuristic) {
        let mut legal: ArrayVec<Move, MAX_MOVES> = ArrayVec::new();
        board.generate_moves(|moves| {
            for mv in moves {
                if legal.try_push(mv).is_err() {
                    return true;
                }
            }
            false
        });

        for mov in legal {
            if Some(mov) == self.best_move {
                continue;
            }
            let score = if self.ordered {
                self.score(board, mov, history)
            } else {
                0
            };
            self.moves.push(ScoredMove { mov, score });
        }
    }

    fn score(&self, board: &Board, mv: Move, history: &HistoryHeuristic) -> i32 {
        if takes_piece(board, mv) {
            let gain = see(board, mv, self.game_phase, &self.piece_values) as i32;
            let tier = if gain >= 0 { GOOD_CAPTURE } else { BAD_CAPTURE };
            return tier + gain * 16 + mvv_lva(board, mv);
        }

        let hist = history.get(board.side_to_move(), mv) as i32;
        if gives_check(board, mv) {
            return QUIET_CHECK + hist;
        }
        if let Some(promotion) = mv.promotion {
            return QUIET_PROMOTION + promotion as i32;
        }
        if let Some(slot) = self.killer_moves.iter().position(|k| *k == Some(mv)) {
            return KILLER - slot as i32;
        }
        hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_ordering::{order_moves, OrderingContext};
    use cozy_chess::{Piece, Square};
    use utils::collect_legal_moves;

    fn context(history: &HistoryHeuristic, killers: [Option<Move>; 2]) -> OrderingContext<'_> {
        OrderingContext {
            killers,
            history,
            phase: 1.0,
            piece_values: PieceValues::default(),
        }
    }

    fn mv(from: Square, to: Square, promotion: Option<Piece>) -> Move {
        Move {
            from,
            to,
            promotion,
        }
    }

    #[test]
    fn returns_every_legal_move_once() {
        let history = HistoryHeuristic::new(512, 13, 4);
        let board: Board = "r1bqkbnr/pppp1ppp/2n5/4p3/3PP3/5N2/PPP2PPP/RNBQKB1R b KQkq - 0 3"
            .parse()
            .unwrap();
        let mut ordered = order_moves(&board, None, &context(&history, [None; 2]));
        let mut legal = collect_legal_moves(&board);
        assert_eq!(ordered.len(), legal.len());

        let key = |m: &Move| utils::move_key(*m);
        ordered.sort_by_key(key);
        legal.sort_by_key(key);
        assert_eq!(ordered, legal);
    }

    #[test]
    fn hint_comes_first_and_illegal_hint_is_ignored() {
        let history = HistoryHeuristic::new(512, 13, 4);
        let board = Board::default();
        let hint = mv(Square::B1, Square::C3, None);
        let ordered = order_moves(&board, Some(hint), &context(&history, [None; 2]));
        assert_eq!(ordered[0], hint);
        assert_eq!(ordered.iter().filter(|m| **m == hint).count(), 1);

        let illegal = mv(Square::E2, Square::E5, None);
        let ordered = order_moves(&board, Some(illegal), &context(&history, [None; 2]));
        assert_eq!(ordered.len(), 20);
        assert!(!ordered.contains(&illegal));
    }

    #[test]
    fn winning_capture_before_losing_capture_before_quiets() {
        let history = HistoryHeuristic::new(512, 13, 4);
        // Rook can take a free knight on d5 or a defended pawn on a6
        let board: Board = "4k3/1p6/p7/3n4/8/8/8/R2RK3 w - - 0 1".parse().unwrap();
        let ordered = order_moves(&board, None, &context(&history, [None; 2]));

        let good = mv(Square::D1, Square::D5, None);
        let bad = mv(Square::A1, Square::A6, None);
        let good_idx = ordered.iter().position(|m| *m == good).unwrap();
        let bad_idx = ordered.iter().position(|m| *m == bad).unwrap();
        assert_eq!(good_idx, 0);
        assert_eq!(bad_idx, 1);
    }

    #[test]
    fn checks_then_promotions_then_killers() {
        let history = HistoryHeuristic::new(512, 13, 4);
        let board: Board = "8/P6k/8/8/8/8/8/K5R1 w - - 0 1".parse().unwrap();
        let killer = mv(Square::A1, Square::B1, None);
        let ordered = order_moves(&board, None, &context(&history, [Some(killer), None]));

        // Rg7+ and Rh1+ are the only checks
        let check_a = mv(Square::G1, Square::G7, None);
        let check_b = mv(Square::G1, Square::H1, None);
        let queen_promo = mv(Square::A7, Square::A8, Some(Piece::Queen));
        let knight_promo = mv(Square::A7, Square::A8, Some(Piece::Knight));

        let pos = |m: Move| ordered.iter().position(|x| *x == m).unwrap();
        assert!(pos(check_a) < pos(queen_promo));
        assert!(pos(check_b) < pos(queen_promo));
        assert!(pos(queen_promo) < pos(knight_promo));
        assert!(pos(knight_promo) < pos(killer));
        for quiet in ordered.iter().skip(pos(killer) + 1) {
            assert!(quiet.promotion.is_none() && !gives_check(&board, *quiet));
        }
    }

    #[test]
    fn unordered_picker_follows_generation_order() {
        let history = HistoryHeuristic::new(512, 13, 4);
        let board: Board = "4k3/1p6/p7/3n4/8/8/8/R2RK3 w - - 0 1".parse().unwrap();
        let hint = mv(Square::E1, Square::E2, None);
        let mut picker = MovePicker::new(
            &board,
            Some(hint),
            [None; 2],
            1.0,
            PieceValues::default(),
            false,
        );
        let mut picked = Vec::new();
        while let Some(m) = picker.next(&board, &history) {
            picked.push(m);
        }
        assert_eq!(picked, collect_legal_moves(&board));
    }
}
