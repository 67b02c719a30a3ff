use ahash::AHashSet;
use cozy_chess::{Board, Move};
use quill::{Agent, AgentConfig, Randomize};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use utils::rules;

use crate::config::ExplorationConfig;
use crate::error::{Result, TrainingError};
use crate::opponent::ReferenceOpponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedMove {
    pub mv: Move,
    /// Mover's score of the position, White's point of view
    pub white_eval: Option<i16>,
}

/// One side of a game.
pub trait Player {
    fn name(&self) -> String;

    fn new_game(&mut self) -> Result<()>;

    /// `history` holds the hashes of earlier positions of the game.
    fn play(&mut self, board: &Board, history: &AHashSet<u64>, ply: usize) -> Result<PlayedMove>;
}

/// Agent with search limits and early-game randomization.
pub struct AgentPlayer<'a> {
    agent: &'a mut Agent,
    limits: AgentConfig,
    exploration: ExplorationConfig,
    rng: StdRng,
}

impl<'a> AgentPlayer<'a> {
    pub fn new(
        agent: &'a mut Agent,
        limits: AgentConfig,
        exploration: ExplorationConfig,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        // the agent's own candidate pick follows the same seed
        agent.reseed(rng.gen());
        Self {
            agent,
            limits,
            exploration,
            rng,
        }
    }

    fn randomize(&mut self, ply: usize) -> Option<Randomize> {
        let p = self.exploration.probability(ply);
        if p > 0.0 && self.rng.gen::<f32>() < p {
            Some(Randomize {
                top_k: self.exploration.top_k,
                margin: self.exploration.margin,
            })
        } else {
            None
        }
    }
}

impl Player for AgentPlayer<'_> {
    fn name(&self) -> String {
        self.agent.name()
    }

    fn new_game(&mut self) -> Result<()> {
        self.agent.new_game();
        Ok(())
    }

    fn play(&mut self, board: &Board, history: &AHashSet<u64>, ply: usize) -> Result<PlayedMove> {
        let config = AgentConfig {
            randomize: self.randomize(ply),
            ..self.limits
        };
        let decision = self.agent.decide(board, history.clone(), &config)?;
        Ok(PlayedMove {
            mv: decision.mv,
            white_eval: Some(decision.white_score),
        })
    }
}

pub struct ReferencePlayer<'a> {
    opponent: &'a mut dyn ReferenceOpponent,
}

impl<'a> ReferencePlayer<'a> {
    pub fn new(opponent: &'a mut dyn ReferenceOpponent) -> Self {
        Self { opponent }
    }
}

impl Player for ReferencePlayer<'_> {
    fn name(&self) -> String {
        self.opponent.name()
    }

    fn new_game(&mut self) -> Result<()> {
        self.opponent.new_game()
    }

    fn play(&mut self, board: &Board, _history: &AHashSet<u64>, _ply: usize) -> Result<PlayedMove> {
        let reply = self.opponent.request_move(board)?;
        if !rules::is_legal(board, reply.mv) {
            return Err(TrainingError::unavailable(format!(
                "{} answered with an illegal move {}{}",
                self.opponent.name(),
                reply.mv.from,
                reply.mv.to
            )));
        }
        Ok(PlayedMove {
            mv: reply.mv,
            white_eval: reply.white_eval,
        })
    }
}
