use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use ahash::AHashSet;
use cozy_chess::{Board, Move};
use evaluation::{Evaluator, PieceValues};

use crate::{
    history::{HistoryHeuristic, KillerMoves},
    stack::SearchStack,
    time_control::SearchController,
    transposition::TranspositionTable,
    EngineConfig, MAX_DEPTH,
};

mod eval;
mod quiescence;
mod search;

/// How long a search may run. Depth 0 is treated as 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<u8>,
    pub time: Option<Duration>,
}

impl SearchLimits {
    pub fn new(depth: Option<u8>, time: Option<Duration>) -> Self {
        Self { depth, time }
    }

    pub fn depth(depth: u8) -> Self {
        Self::new(Some(depth), None)
    }

    pub fn time(time: Duration) -> Self {
        Self::new(None, Some(time))
    }
}

/// Outcome of a search. `score` is relative to the side to move at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: i16,
    /// Deepest fully completed iteration
    pub depth: u8,
    pub nodes: u64,
    pub pv: Vec<Move>,
    /// Root moves scored within the tie margin of the best, best first.
    /// Every score here is exact.
    pub candidates: Vec<(Move, i16)>,
    pub timed_out: bool,
}

pub struct Engine {
    /// Configuration for the engine
    config: EngineConfig,

    /// Signal to terminate search from outside
    stop: Arc<AtomicBool>,

    /// Piece values used by move ordering
    piece_values: PieceValues,

    /// Static evaluation, White-positive
    evaluator: Box<dyn Evaluator>,

    /// The position we are finding the best move for (root position)
    board: Board,
    /// Position hashes for repetition detection - all positions up until the search.
    game_history: AHashSet<u64>,

    /// Number of nodes searched
    nodes: u64,
    /// Selective depth (max ply reached including quiescence)
    max_depth_reached: u8,

    /// Main transposition table, shared with quiescence
    tt: TranspositionTable,

    /// Tracks active search path - used for repetition detection
    search_stack: SearchStack,

    /// Quiet moves that caused beta cutoffs
    killer_moves: KillerMoves,
    /// Scores quiet moves by search success
    history_heuristic: HistoryHeuristic,

    /// Deadline and stop handling for the running search
    controller: SearchController,
}

impl Engine {
    pub fn new(config: &EngineConfig, evaluator: Box<dyn Evaluator>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let mut instance = Self {
            config: config.clone(),
            piece_values: PieceValues::default(),
            controller: SearchController::new(
                &SearchLimits::default(),
                config.default_depth.value,
                MAX_DEPTH as u8 - 1,
                stop.clone(),
            ),
            stop,

            evaluator,

            board: Board::default(),
            game_history: AHashSet::new(),
            nodes: 0,
            max_depth_reached: 0,

            tt: TranspositionTable::new(1),
            search_stack: SearchStack::with_capacity(MAX_DEPTH),

            killer_moves: KillerMoves::new(),
            history_heuristic: HistoryHeuristic::new(1, 1, 1),
        };

        instance.configure(config, true);

        instance
    }

    pub fn configure(&mut self, config: &EngineConfig, init: bool) {
        let old_config = std::mem::replace(&mut self.config, config.clone());

        if init || old_config.hash_size.value != config.hash_size.value {
            self.tt = TranspositionTable::new(config.hash_size.value);
        }

        if init || !self.history_heuristic.matches_config(config) {
            self.history_heuristic.configure(config);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn name(&self) -> String {
        format!("Negamax ({})", self.evaluator.name())
    }

    /// Forget everything learned in the previous game.
    pub fn new_game(&mut self) {
        self.init_game();
    }

    pub fn set_position(&mut self, board: Board, game_history: AHashSet<u64>) {
        self.board = board;
        self.game_history = game_history;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Handle for stopping a running search from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Static evaluation of a position, White-positive, as the search sees it.
    pub fn evaluate(&mut self, board: &Board) -> i16 {
        self.refresh_evaluator();
        self.white_eval(board)
    }

    pub(super) fn init_game(&mut self) {
        self.tt.clear();
        self.history_heuristic.reset();
        self.killer_moves.clear();
        self.search_stack.clear();
    }
}
