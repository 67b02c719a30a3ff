use std::sync::atomic::Ordering;

use cozy_chess::{Board, Move};
use evaluation::scores::{is_mate_score, mate_distance, MATE_VALUE, SCORE_INF};
use utils::{
    collect_legal_moves, game_phase, has_check, make_move, move_key, rules, takes_piece, Terminal,
};

use crate::{
    move_ordering::{order_moves, MovePicker, OrderingContext},
    pruning::{mate_distance_prune, AspirationWindow, Pass},
    time_control::SearchController,
    transposition::Bound,
    SearchError, MAX_DEPTH,
};

use super::{Engine, SearchLimits, SearchResult};

/// A root move searched to completion in one pass.
struct RootMove {
    mv: Move,
    score: i16,
    bound: Bound,
    pv: Vec<Move>,
}

/// All root moves of one pass, in search order.
struct RootPass {
    moves: Vec<RootMove>,
    /// False when the pass was interrupted before every move was searched
    complete: bool,
}

/// Result of the deepest completed iteration.
struct Completed {
    best_move: Move,
    score: i16,
    depth: u8,
    pv: Vec<Move>,
    candidates: Vec<(Move, i16)>,
}

impl Engine {
    /// Searches `board` with no prior game history.
    pub fn search_position(
        &mut self,
        board: &Board,
        depth_limit: Option<u8>,
        time_budget: Option<std::time::Duration>,
    ) -> Result<SearchResult, SearchError> {
        self.set_position(board.clone(), Default::default());
        self.search(&SearchLimits::new(depth_limit, time_budget))
    }

    /// Iterative deepening from the position given to `set_position`.
    pub fn search(&mut self, limits: &SearchLimits) -> Result<SearchResult, SearchError> {
        let root_moves = self.prepare_search(limits)?;

        let mut window = AspirationWindow::new(
            self.config.aspiration_window_size.value,
            self.config.aspiration_window_widen.value,
            self.config.aspiration_window_depth.value,
        );

        let mut completed: Option<Completed> = None;
        let mut depth: u8 = 1;

        while self.controller.should_continue_to_next_depth(depth) {
            self.controller.on_iteration_start();
            window.begin_depth(depth, completed.as_ref().map_or(0, |c| c.score));

            let mut retries = 0;
            let iteration = loop {
                let (alpha, beta) = window.bounds();
                let hint = completed.as_ref().map(|c| c.best_move);
                let pass = self.search_root(&root_moves, hint, depth, alpha, beta);

                if !pass.complete {
                    if let Some(adopted) = adopt_partial_mate(&pass, completed.as_ref()) {
                        completed = Some(adopted);
                    }
                    break None;
                }

                let ranked = rank(&pass.moves, self.config.root_tie_margin.value);
                let Some(&(best_move, best_score)) = ranked.first() else {
                    break None;
                };

                match window.analyse_pass(best_score) {
                    Pass::Hit(score) => {
                        let margin = self.config.root_tie_margin.value;
                        let all_exact = pass
                            .moves
                            .iter()
                            .filter(|m| m.score as i32 > score as i32 - margin as i32)
                            .all(|m| m.bound == Bound::Exact);

                        if all_exact {
                            let pv = pass
                                .moves
                                .into_iter()
                                .find(|m| m.mv == best_move)
                                .map(|m| m.pv)
                                .unwrap_or_else(|| vec![best_move]);
                            break Some(Completed {
                                best_move,
                                score,
                                depth,
                                pv,
                                candidates: ranked,
                            });
                        }
                        // A near-best move only has an upper bound
                        window.open_low();
                    }
                    Pass::FailLow | Pass::FailHigh => {
                        retries += 1;
                        if retries >= self.config.aspiration_window_retries.value {
                            window.fully_extend();
                        }
                    }
                }
            };

            let Some(iteration) = iteration else {
                break;
            };

            self.controller.on_iteration_complete();
            log::debug!(
                "depth {} score {} nodes {} seldepth {} hashfull {} pv {}",
                depth,
                iteration.score,
                self.nodes,
                self.max_depth_reached,
                self.tt.hashfull(),
                format_pv(&iteration.pv),
            );

            let mate_plies = mate_distance(iteration.score).map(i16::abs);
            completed = Some(iteration);
            // A mate within the searched horizon cannot get shorter
            if mate_plies.is_some_and(|plies| depth as i16 >= plies) {
                break;
            }
            depth += 1;
        }

        self.finish(completed)
    }

    /// Runs exactly one full-window iteration at `depth`.
    pub fn search_fixed_depth(
        &mut self,
        board: &Board,
        depth: u8,
    ) -> Result<SearchResult, SearchError> {
        self.set_position(board.clone(), Default::default());
        let depth = depth.max(1);
        let root_moves = self.prepare_search(&SearchLimits::depth(depth))?;

        let pass = self.search_root(&root_moves, None, depth, -SCORE_INF, SCORE_INF);
        let ranked = rank(&pass.moves, self.config.root_tie_margin.value);

        let completed = ranked.first().copied().map(|(best_move, score)| {
            let pv = pass
                .moves
                .iter()
                .find(|m| m.mv == best_move)
                .map(|m| m.pv.clone())
                .unwrap_or_else(|| vec![best_move]);
            Completed {
                best_move,
                score,
                depth,
                pv,
                candidates: ranked.clone(),
            }
        });

        self.finish(completed)
    }

    fn prepare_search(&mut self, limits: &SearchLimits) -> Result<Vec<Move>, SearchError> {
        let root_moves = collect_legal_moves(&self.board);
        if root_moves.is_empty() {
            let terminal = if has_check(&self.board) {
                Terminal::Checkmate
            } else {
                Terminal::Stalemate
            };
            return Err(SearchError::NoLegalMoves(terminal));
        }

        self.stop.store(false, Ordering::Relaxed);
        self.refresh_evaluator();
        self.controller = SearchController::new(
            limits,
            self.config.default_depth.value,
            MAX_DEPTH as u8 - 1,
            self.stop.clone(),
        );
        self.nodes = 0;
        self.max_depth_reached = 0;
        self.tt.age();
        self.search_stack.clear();
        self.search_stack.push(self.board.hash());

        Ok(root_moves)
    }

    fn finish(&mut self, completed: Option<Completed>) -> Result<SearchResult, SearchError> {
        // Depth 1 always completes, so this only trips on a broken root pass
        let completed = completed.ok_or(SearchError::NoLegalMoves(Terminal::Stalemate))?;

        if !self.board.is_legal(completed.best_move) {
            return Err(SearchError::RulesViolation(completed.best_move));
        }

        Ok(SearchResult {
            best_move: completed.best_move,
            score: completed.score,
            depth: completed.depth,
            nodes: self.nodes,
            pv: completed.pv,
            candidates: completed.candidates,
            timed_out: self.controller.halted(),
        })
    }

    /// Searches every root move. Once a best score exists, later moves are
    /// searched with the floor `best - margin` so every move that could tie
    /// the best gets an exact score.
    fn search_root(
        &mut self,
        root_moves: &[Move],
        hint: Option<Move>,
        max_depth: u8,
        alpha: i16,
        beta: i16,
    ) -> RootPass {
        let board = self.board.clone();
        let ordered = if self.config.move_ordering.value {
            let context = OrderingContext {
                killers: self.killer_moves.get(0),
                history: &self.history_heuristic,
                phase: game_phase(&board),
                piece_values: self.piece_values,
            };
            order_moves(&board, hint, &context)
        } else {
            root_moves.to_vec()
        };

        let margin = self.config.root_tie_margin.value.max(1);
        let mut moves = Vec::with_capacity(ordered.len());
        let mut best: Option<i16> = None;

        for mv in ordered {
            let floor = match best {
                None => alpha,
                Some(best) => best.saturating_sub(margin).max(-SCORE_INF),
            };

            let child = make_move(&board, mv);
            self.search_stack.push(child.hash());

            let (score, line) = if best.is_none() {
                self.search_child(&child, max_depth, -beta, -floor)
            } else {
                let (probe, line) = self.search_child(&child, max_depth, -floor - 1, -floor);
                if probe > floor && probe < beta {
                    self.search_child(&child, max_depth, -beta, -floor)
                } else {
                    (probe, line)
                }
            };

            self.search_stack.pop();

            if self.controller.halted() {
                return RootPass {
                    moves,
                    complete: false,
                };
            }

            let mut pv = Vec::with_capacity(line.len() + 1);
            pv.push(mv);
            pv.extend(line);

            moves.push(RootMove {
                mv,
                score,
                bound: Bound::classify(score, floor, beta),
                pv,
            });

            if best.map_or(true, |b| score > b) {
                best = Some(score);
            }
            if score >= beta {
                break;
            }
        }

        RootPass {
            moves,
            complete: true,
        }
    }

    /// Negated child search, side-to-move relative to the parent.
    #[inline(always)]
    fn search_child(
        &mut self,
        child: &Board,
        max_depth: u8,
        alpha: i16,
        beta: i16,
    ) -> (i16, Vec<Move>) {
        let (score, line) = self.search_subtree(child, 1, max_depth, alpha, beta);
        (-score, line)
    }

    pub(super) fn search_subtree(
        &mut self,
        board: &Board,
        ply: u8,
        max_depth: u8,
        mut alpha: i16,
        mut beta: i16,
    ) -> (i16, Vec<Move>) {
        let remaining_depth = max_depth.saturating_sub(ply);
        if remaining_depth == 0 || ply as usize >= MAX_DEPTH - 1 {
            return self.quiescence_search(board, alpha, beta, ply);
        }

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

        if mate_distance_prune(&mut alpha, &mut beta, ply) {
            return (alpha, Vec::new());
        }

        let hash = board.hash();
        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(hash, ply) {
            tt_move = entry.best_move.filter(|mv| board.is_legal(*mv));

            if entry.depth >= remaining_depth {
                match entry.bound {
                    Bound::Exact => return (entry.value, tt_move.into_iter().collect()),
                    Bound::Lower => alpha = alpha.max(entry.value),
                    Bound::Upper => beta = beta.min(entry.value),
                }
                if alpha >= beta {
                    return (entry.value, Vec::new());
                }
            }
        }

        let search_alpha = alpha;
        let search_beta = beta;

        let mut picker = MovePicker::new(
            board,
            tt_move,
            self.killer_moves.get(ply as usize),
            game_phase(board),
            self.piece_values,
            self.config.move_ordering.value,
        );

        let mut best_value = -SCORE_INF;
        let mut best_move = None;
        let mut best_line = Vec::new();
        let mut quiets_searched: Vec<Move> = Vec::new();
        let mut move_index = 0;

        while let Some(mv) = picker.next(board, &self.history_heuristic) {
            let child = make_move(board, mv);
            self.search_stack.push(child.hash());

            let (value, line) = self.search_move(&child, ply, max_depth, alpha, beta, move_index);

            self.search_stack.pop();

            if self.controller.halted() {
                return (0, Vec::new());
            }

            move_index += 1;

            if value > best_value {
                best_value = value;
                best_move = Some(mv);
                best_line = Vec::with_capacity(line.len() + 1);
                best_line.push(mv);
                best_line.extend(line);
            }
            alpha = alpha.max(value);

            if alpha >= beta {
                self.on_fail_high(board, mv, ply, remaining_depth, &quiets_searched);
                break;
            }

            if !takes_piece(board, mv) {
                quiets_searched.push(mv);
            }
        }

        self.tt.store(
            hash,
            ply,
            remaining_depth,
            best_value,
            None,
            search_alpha,
            search_beta,
            best_move,
        );

        (best_value, best_line)
    }

    /// Principal variation search: the first move gets the full window, later
    /// moves a null window that is widened only when they beat alpha.
    fn search_move(
        &mut self,
        child: &Board,
        ply: u8,
        max_depth: u8,
        alpha: i16,
        beta: i16,
        move_index: usize,
    ) -> (i16, Vec<Move>) {
        if move_index == 0 {
            let (score, line) = self.search_subtree(child, ply + 1, max_depth, -beta, -alpha);
            return (-score, line);
        }

        let (score, line) = self.search_subtree(child, ply + 1, max_depth, -alpha - 1, -alpha);
        let score = -score;
        if score > alpha && score < beta {
            let (score, line) = self.search_subtree(child, ply + 1, max_depth, -beta, -alpha);
            return (-score, line);
        }
        (score, line)
    }

    fn on_fail_high(
        &mut self,
        board: &Board,
        mv: Move,
        ply: u8,
        remaining_depth: u8,
        quiets_searched: &[Move],
    ) {
        if takes_piece(board, mv) || mv.promotion.is_some() {
            return;
        }

        let color = board.side_to_move();
        self.killer_moves.store(ply as usize, mv);

        let bonus = self.history_heuristic.get_bonus(remaining_depth);
        self.history_heuristic.update(color, mv, bonus);

        let malus = self.history_heuristic.get_malus(remaining_depth);
        for &quiet in quiets_searched {
            self.history_heuristic.update(color, quiet, malus);
        }
    }
}

/// Score of a terminal node for the side to move at `ply`.
#[inline(always)]
pub(super) fn terminal_score(terminal: Terminal, ply: u8) -> i16 {
    match terminal {
        Terminal::Checkmate => -(MATE_VALUE - ply as i16),
        _ => 0,
    }
}

/// Root moves within `margin` of the best, best first. Equal scores are
/// ordered by move key so the choice does not depend on search order.
fn rank(moves: &[RootMove], margin: i16) -> Vec<(Move, i16)> {
    let Some(best) = moves.iter().map(|m| m.score).max() else {
        return Vec::new();
    };
    let floor = best as i32 - margin.max(1) as i32;

    let mut ranked: Vec<(Move, i16)> = moves
        .iter()
        .filter(|m| m.score as i32 > floor)
        .map(|m| (m.mv, m.score))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(move_key(a.0).cmp(&move_key(b.0))));
    ranked
}

/// A move searched to completion in an interrupted iteration replaces the
/// completed result only if it proves a faster winning mate.
fn adopt_partial_mate(pass: &RootPass, completed: Option<&Completed>) -> Option<Completed> {
    let completed = completed?;
    let proven = pass
        .moves
        .iter()
        .filter(|m| m.bound != Bound::Upper && m.score > 0 && is_mate_score(m.score))
        .max_by(|a, b| a.score.cmp(&b.score).then(move_key(b.mv).cmp(&move_key(a.mv))))?;

    if proven.score <= completed.score {
        return None;
    }

    Some(Completed {
        best_move: proven.mv,
        score: proven.score,
        depth: completed.depth,
        pv: proven.pv.clone(),
        candidates: vec![(proven.mv, proven.score)],
    })
}

fn format_pv(pv: &[Move]) -> String {
    pv.iter()
        .map(|mv| format!("{}{}", mv.from, mv.to))
        .collect::<Vec<_>>()
        .join(" ")
}
