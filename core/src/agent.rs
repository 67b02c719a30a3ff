use std::sync::Arc;
use std::time::Duration;

use ahash::AHashSet;
use cozy_chess::{Board, Move};
use evaluation::{
    CheckpointHandle, CheckpointStore, EvaluatorParameters, ParameterStore, ParametricEvaluator,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use search::{Engine, EngineConfig, SearchLimits};
use utils::{collect_legal_moves, flip_eval_perspective};

use crate::AgentError;

/// Widest tie margin the engine accepts.
const MAX_MARGIN: i16 = 200;

/// Pick uniformly among the best `top_k` root moves scored within `margin`
/// centipawns of the best one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Randomize {
    pub top_k: usize,
    pub margin: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    pub depth_limit: Option<u8>,
    pub time_budget: Option<Duration>,
    pub randomize: Option<Randomize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            depth_limit: Some(4),
            time_budget: None,
            randomize: None,
        }
    }
}

/// A chosen move with what the search knew about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub mv: Move,
    /// Score of the best line, side to move relative
    pub score: i16,
    /// The same score from White's point of view
    pub white_score: i16,
    pub depth: u8,
    pub nodes: u64,
    pub timed_out: bool,
}

pub struct Agent {
    engine: Engine,
    store: Arc<ParameterStore>,
    engine_config: EngineConfig,
    rng: StdRng,
}

impl Agent {
    /// Agent reading the live parameters in `store`.
    pub fn new(store: Arc<ParameterStore>, engine_config: &EngineConfig) -> Self {
        let evaluator = Box::new(ParametricEvaluator::new(store.clone()));
        Self {
            engine: Engine::new(engine_config, evaluator),
            store,
            engine_config: engine_config.clone(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Agent with its own store holding `params`.
    pub fn with_parameters(params: EvaluatorParameters, engine_config: &EngineConfig) -> Self {
        Self::new(ParameterStore::shared(params), engine_config)
    }

    /// Agent on the newest valid checkpoint, or default parameters if there is none.
    pub fn from_checkpoints(
        checkpoints: &CheckpointStore,
        engine_config: &EngineConfig,
    ) -> (Self, Option<CheckpointHandle>) {
        let (params, handle) = checkpoints.load_latest();
        if let Some(handle) = &handle {
            info!(
                "Loaded parameters v{} from {}",
                params.version,
                handle.path.display()
            );
        }
        (Self::with_parameters(params, engine_config), handle)
    }

    /// Deterministic randomization for reproducible games.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Restarts the randomized candidate pick from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    pub fn name(&self) -> String {
        self.engine.name()
    }

    pub fn new_game(&mut self) {
        self.engine.new_game();
    }

    /// Static evaluation of `board` from White's point of view.
    pub fn evaluate(&mut self, board: &Board) -> i16 {
        self.engine.evaluate(board)
    }

    pub fn choose_move(&mut self, board: &Board, config: &AgentConfig) -> Result<Move, AgentError> {
        self.decide(board, AHashSet::new(), config).map(|d| d.mv)
    }

    /// Search with the hashes of earlier game positions for repetition.
    pub fn decide(
        &mut self,
        board: &Board,
        history: AHashSet<u64>,
        config: &AgentConfig,
    ) -> Result<Decision, AgentError> {
        self.apply_margin(config.randomize.map(|r| r.margin));

        self.engine.set_position(board.clone(), history);
        let result = self
            .engine
            .search(&SearchLimits::new(config.depth_limit, config.time_budget))?;

        let mv = match config.randomize {
            Some(randomize) if randomize.top_k > 1 => {
                let pool = result.candidates.len().min(randomize.top_k).max(1);
                let pick = self.rng.gen_range(0..pool);
                result
                    .candidates
                    .get(pick)
                    .map_or(result.best_move, |(mv, _)| *mv)
            }
            _ => result.best_move,
        };

        if !collect_legal_moves(board).contains(&mv) {
            return Err(AgentError::RulesViolation(mv));
        }

        debug!(
            "chose {}{} at depth {} score {} ({} nodes)",
            mv.from, mv.to, result.depth, result.score, result.nodes
        );

        Ok(Decision {
            mv,
            score: result.score,
            white_score: flip_eval_perspective(board, result.score),
            depth: result.depth,
            nodes: result.nodes,
            timed_out: result.timed_out,
        })
    }

    fn apply_margin(&mut self, margin: Option<i16>) {
        let wanted = margin
            .map_or(self.engine_config.root_tie_margin.value, |m| {
                m.clamp(1, MAX_MARGIN)
            });
        if self.engine.config().root_tie_margin.value != wanted {
            let mut config = self.engine.config().clone();
            config.root_tie_margin.value = wanted;
            self.engine.configure(&config, false);
        }
    }
}
