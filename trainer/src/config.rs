use evaluation::EvaluatorParameters;
use quill::AgentConfig;
use search::EngineConfig;

/// How targets for the learned weights are derived from a finished game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateRule {
    /// TD(λ) returns toward the game result. λ = 1 is a pure Monte Carlo target,
    /// λ = 0 bootstraps from the next position only.
    TemporalDifference { lambda: f32 },
    /// Fit the reference opponent's evaluation of every position.
    Supervised,
}

impl Default for UpdateRule {
    fn default() -> Self {
        UpdateRule::TemporalDifference { lambda: 0.7 }
    }
}

/// What to do with a game whose reference opponent failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentFailurePolicy {
    /// Replay the game up to `n` more times, then skip it.
    Retry(u32),
    Skip,
}

impl Default for OpponentFailurePolicy {
    fn default() -> Self {
        OpponentFailurePolicy::Retry(2)
    }
}

/// Early-game randomization so self-play games differ.
///
/// At full move `n` the agent randomizes with probability
/// `initial_probability * exp(-n / decay_turns)`, until that drops below
/// `min_probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationConfig {
    pub initial_probability: f32,
    pub decay_turns: f32,
    pub min_probability: f32,
    /// Candidates to sample from when randomizing
    pub top_k: usize,
    /// Centipawns from the best move a candidate may lose
    pub margin: i16,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            initial_probability: 1.0,
            decay_turns: 7.5,
            min_probability: 0.02,
            top_k: 4,
            margin: 40,
        }
    }
}

impl ExplorationConfig {
    /// No randomization at all.
    pub fn disabled() -> Self {
        Self {
            initial_probability: 0.0,
            ..Self::default()
        }
    }

    /// Chance of randomizing the move at `ply`. Both sides get the same chance per turn.
    pub fn probability(&self, ply: usize) -> f32 {
        let turns = (ply / 2) as f32;
        let p = self.initial_probability * (-turns / self.decay_turns.max(f32::EPSILON)).exp();
        if p < self.min_probability {
            0.0
        } else {
            p.min(1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// Full-batch optimizer steps per game
    pub steps_per_game: usize,
    /// Updates leaving any |w| above this are rejected
    pub max_weight: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            weight_decay: 0.0,
            steps_per_game: 16,
            max_weight: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub engine: EngineConfig,
    /// Search limits for the learning agent's moves
    pub agent: AgentConfig,
    pub exploration: ExplorationConfig,
    pub update_rule: UpdateRule,
    pub optimizer: OptimizerConfig,
    /// Games reaching this many plies are adjudicated drawn
    pub max_plies: usize,
    /// Starting position, defaults to the standard one
    pub start_fen: Option<String>,
    /// Save a checkpoint every this many completed games; 0 saves only at the end
    pub checkpoint_interval: usize,
    /// Self-play games played concurrently against one frozen snapshot
    pub parallel_games: usize,
    pub on_opponent_failure: OpponentFailurePolicy,
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let mut engine = EngineConfig::default();
        engine.hash_size.value = 8;

        Self {
            engine,
            agent: AgentConfig {
                depth_limit: Some(3),
                time_budget: None,
                randomize: None,
            },
            exploration: ExplorationConfig::default(),
            update_rule: UpdateRule::default(),
            optimizer: OptimizerConfig::default(),
            max_plies: 200,
            start_fen: None,
            checkpoint_interval: 50,
            parallel_games: 1,
            on_opponent_failure: OpponentFailurePolicy::default(),
            seed: None,
        }
    }
}

/// Periodic measurement of the trained parameters against a fixed baseline.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub baseline: EvaluatorParameters,
    /// Match games, colors alternating; 0 skips the match
    pub games: usize,
    /// See `MatchConfig::adjudication`
    pub adjudication: Option<i32>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            baseline: EvaluatorParameters::material_only(),
            games: 10,
            adjudication: Some(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exploration_decays_per_turn() {
        let config = ExplorationConfig::default();
        assert_eq!(config.probability(0), 1.0);
        // White and Black share a turn
        assert_eq!(config.probability(2), config.probability(3));
        assert!(config.probability(10) < config.probability(2));
        assert_eq!(config.probability(200), 0.0);
    }

    #[test]
    fn disabled_exploration_never_randomizes() {
        let config = ExplorationConfig::disabled();
        assert!((0..40).all(|ply| config.probability(ply) == 0.0));
    }
}
