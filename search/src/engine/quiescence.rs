use cozy_chess::{Board, Move, Piece, Rank};
use evaluation::scores::{MATE_VALUE, SCORE_INF};
use utils::{game_phase, has_check, is_capture, make_move, rules};

use crate::{
    move_ordering::QMoveGenerator, pruning::mate_distance_prune, transposition::Bound,
    utils::see::see, MAX_DEPTH,
};

use super::{search::terminal_score, Engine};

impl Engine {
    /// Resolves captures, and every evasion when in check, until the position is quiet.
    ///
    /// Quiet promotions are left to the main search. Evasions keep material, so
    /// lines are bounded by the repetition check and the `MAX_DEPTH` ply cap.
    pub(super) fn quiescence_search(
        &mut self,
        board: &Board,
        mut alpha: i16,
        mut beta: i16,
        ply: u8,
    ) -> (i16, Vec<Move>) {
        if self.controller.should_stop() {
            return (0, Vec::new());
        }

        self.nodes += 1;
        self.max_depth_reached = self.max_depth_reached.max(ply);

        // If this position has been seen before, treat it as a draw
        if self.search_stack.is_repetition(&self.game_history) {
            return (0, Vec::new());
        }

        if let Some(terminal) = rules::terminal(board) {
            return (terminal_score(terminal, ply), Vec::new());
        }

        if ply as usize >= MAX_DEPTH - 1 {
            return (self.eval(board), Vec::new());
        }

        if mate_distance_prune(&mut alpha, &mut beta, ply) {
            return (alpha, Vec::new());
        }

        let hash = board.hash();
        let original_alpha = alpha;
        let original_beta = beta;

        let mut cached_eval = None;
        if let Some(entry) = self.tt.probe(hash, ply) {
            cached_eval = entry.static_eval;
            match entry.bound {
                Bound::Exact => return (entry.value, Vec::new()),
                Bound::Lower if entry.value >= beta => return (entry.value, Vec::new()),
                Bound::Upper if entry.value <= alpha => return (entry.value, Vec::new()),
                _ => {}
            }
        }

        let in_check = has_check(board);
        let phase = game_phase(board);

        let stand_pat = if in_check {
            None
        } else {
            Some(match cached_eval {
                Some(eval) => eval,
                None => self.eval(board),
            })
        };

        // Do a "stand-pat" evaluation if not in check
        if let Some(stand_pat) = stand_pat {
            if stand_pat >= beta {
                self.tt.store(
                    hash,
                    ply,
                    0,
                    stand_pat,
                    Some(stand_pat),
                    original_alpha,
                    original_beta,
                    None,
                );
                return (stand_pat, Vec::new());
            }
            alpha = alpha.max(stand_pat);
        }

        let mut best_line = Vec::new();
        let mut best_move = None;
        let mut best_eval = stand_pat.unwrap_or(-SCORE_INF);

        let mut moves = QMoveGenerator::new(
            in_check,
            board,
            phase,
            &self.piece_values,
            self.config.move_ordering.value,
        );

        while let Some(mv) = moves.next() {
            if let Some(stand_pat) = stand_pat {
                if self.config.qs_delta_pruning.value
                    && stand_pat as i32 + self.capture_delta(board, mv, phase) < alpha as i32
                {
                    continue;
                }
                if self.config.qs_see_pruning.value
                    && see(board, mv, phase, &self.piece_values) < 0
                {
                    continue;
                }
            }

            let child = make_move(board, mv);
            self.search_stack.push(child.hash());
            let (child_score, child_line) = self.quiescence_search(&child, -beta, -alpha, ply + 1);
            self.search_stack.pop();

            if self.controller.halted() {
                return (0, Vec::new());
            }

            let value = -child_score;
            if value > best_eval {
                best_eval = value;
                best_move = Some(mv);
                best_line = Vec::with_capacity(child_line.len() + 1);
                best_line.push(mv);
                best_line.extend(child_line);
                alpha = alpha.max(best_eval);
            }

            if alpha >= beta {
                break; // Beta cutoff
            }
        }

        // In check with every evasion refuted or none available
        if in_check && best_eval == -SCORE_INF {
            return (-(MATE_VALUE - ply as i16), Vec::new());
        }

        self.tt.store(
            hash,
            ply,
            0,
            best_eval,
            stand_pat,
            original_alpha,
            original_beta,
            best_move,
        );
        (best_eval, best_line)
    }

    /// Most material a capture can win, plus the safety margin.
    fn capture_delta(&self, board: &Board, mv: Move, phase: f32) -> i32 {
        let captured = if is_capture(board, mv) {
            board.piece_on(mv.to).unwrap_or(Piece::Pawn)
        } else {
            Piece::Pawn
        };
        let mut delta = self.piece_values.get(captured, phase) as i32
            + self.config.qs_delta_margin.value as i32;

        let promotes = board.piece_on(mv.from) == Some(Piece::Pawn)
            && mv.to.rank() == Rank::Eighth.relative_to(board.side_to_move());
        if promotes {
            delta += self.piece_values.get(Piece::Queen, phase) as i32
                - self.piece_values.get(Piece::Pawn, phase) as i32;
        }
        delta
    }
}
