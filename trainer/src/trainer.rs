use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cozy_chess::Board;
use evaluation::{
    CheckpointHandle, CheckpointStore, EvaluatorParameters, ParameterStore, ParametricEvaluator,
};
use log::{debug, error, info, warn};
use quill::Agent;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use utils::GameOutcome;

use crate::analysis::{analyze_game, GameAnalysis};
use crate::arena::{play_match, MatchConfig};
use crate::config::{
    EvaluationConfig, ExplorationConfig, OpponentFailurePolicy, TrainerConfig, UpdateRule,
};
use crate::error::{Result, TrainingError};
use crate::game::{play_game, start_position, AgentPlayer, GameRecord, ReferencePlayer};
use crate::metrics::{EvaluationMetrics, GameMetrics, MetricsSink, UpdateStatus};
use crate::opponent::{OpponentSource, ReferenceOpponent};
use crate::update::{build_samples, eval_drift, Learner};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSummary {
    pub games_played: usize,
    /// Games given up after the reference opponent failed
    pub games_skipped: usize,
    pub updates_applied: usize,
    pub updates_rejected: usize,
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    pub final_version: u32,
    pub last_checkpoint: Option<CheckpointHandle>,
    pub stopped_early: bool,
}

/// Plays training games and folds each one into the shared parameters.
///
/// The trainer is the only writer of `store`. Every game ends with at most one
/// `publish`, so agents reading the store see whole parameter sets only.
pub struct Trainer {
    config: TrainerConfig,
    store: Arc<ParameterStore>,
    opponent: OpponentSource,
    checkpoints: Option<CheckpointStore>,
    learner: Learner,
    agent: Agent,
    /// Second self-play agent on the same store
    sparring: Agent,
    stop: Arc<AtomicBool>,
    seed: u64,
    next_game: usize,
    games_since_checkpoint: usize,
    last_checkpoint: Option<CheckpointHandle>,
}

impl Trainer {
    pub fn new(
        config: TrainerConfig,
        store: Arc<ParameterStore>,
        opponent: OpponentSource,
        checkpoints: Option<CheckpointStore>,
    ) -> Result<Self> {
        if config.update_rule == UpdateRule::Supervised
            && matches!(opponent, OpponentSource::SelfPlay)
        {
            return Err(TrainingError::Config(
                "supervised updates need a reference opponent".to_string(),
            ));
        }
        if let UpdateRule::TemporalDifference { lambda } = config.update_rule {
            if !(0.0..=1.0).contains(&lambda) {
                return Err(TrainingError::Config(format!(
                    "lambda must be in [0, 1], got {}",
                    lambda
                )));
            }
        }
        start_position(config.start_fen.as_deref())?;

        let learner = Learner::new(&store.snapshot().learned, config.optimizer)?;
        let agent = Agent::new(store.clone(), &config.engine);
        let sparring = Agent::new(store.clone(), &config.engine);
        let seed = config
            .seed
            .unwrap_or_else(|| StdRng::from_entropy().gen::<u64>());

        info!(
            "Training {} from parameters v{} ({:?})",
            opponent.describe(),
            store.version(),
            config.update_rule
        );

        Ok(Self {
            config,
            store,
            opponent,
            checkpoints,
            learner,
            agent,
            sparring,
            stop: Arc::new(AtomicBool::new(false)),
            seed,
            next_game: 0,
            games_since_checkpoint: 0,
            last_checkpoint: None,
        })
    }

    /// Setting the flag ends the run after the current game.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn last_checkpoint(&self) -> Option<&CheckpointHandle> {
        self.last_checkpoint.as_ref()
    }

    /// Plays `num_games` games, updating the parameters after each one.
    ///
    /// A game whose reference opponent fails is retried or skipped per
    /// `on_opponent_failure`, and a divergent update is rejected. Neither ends
    /// the run.
    pub fn run_training(
        &mut self,
        num_games: usize,
        sink: &mut dyn MetricsSink,
    ) -> Result<TrainingSummary> {
        let start = start_position(self.config.start_fen.as_deref())?;
        let mut summary = TrainingSummary::default();
        let mut remaining = num_games;

        while remaining > 0 {
            if self.stop.load(Ordering::Relaxed) {
                info!("Stop requested, ending training early");
                summary.stopped_early = true;
                break;
            }

            let batch = match self.opponent {
                OpponentSource::SelfPlay => self.config.parallel_games.clamp(1, remaining),
                OpponentSource::VersusReference(_) => 1,
            };
            let first = self.next_game;
            let records = if batch > 1 {
                self.play_parallel(&start, first, batch)?
            } else {
                vec![self.play_with_retries(&start, first)?]
            };
            self.next_game += batch;
            remaining -= batch;

            for (offset, record) in records.into_iter().enumerate() {
                match record {
                    Some(record) => self.absorb(first + offset, &record, &mut summary, sink)?,
                    None => summary.games_skipped += 1,
                }
            }
        }

        Ok(self.finish(summary, sink))
    }

    /// Fits the parameters to recorded games instead of playing new ones.
    ///
    /// Supervised updates ask the reference opponent to evaluate every
    /// position first; a game it fails on is skipped.
    pub fn train_on_games(
        &mut self,
        games: &[GameRecord],
        sink: &mut dyn MetricsSink,
    ) -> Result<TrainingSummary> {
        let mut summary = TrainingSummary::default();

        for game in games {
            if self.stop.load(Ordering::Relaxed) {
                info!("Stop requested, ending training early");
                summary.stopped_early = true;
                break;
            }
            let index = self.next_game;
            self.next_game += 1;

            let mut record = game.clone();
            match self.annotate(&mut record) {
                Ok(()) => {}
                Err(TrainingError::OpponentUnavailable(reason)) => {
                    warn!("Skipping recorded game {}: {}", index, reason);
                    summary.games_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }
            self.absorb(index, &record, &mut summary, sink)?;
        }

        Ok(self.finish(summary, sink))
    }

    /// Measures the current parameters against `config.baseline` and, given an
    /// analyst, reviews one greedy self-play game move by move.
    ///
    /// The result goes to `sink` as well as back to the caller. An analyst
    /// failure only drops the review.
    pub fn evaluate(
        &mut self,
        config: &EvaluationConfig,
        analyst: Option<&mut dyn ReferenceOpponent>,
        sink: &mut dyn MetricsSink,
    ) -> Result<EvaluationMetrics> {
        let params = (*self.store.snapshot()).clone();

        let baseline = if config.games > 0 {
            let mut current = Agent::with_parameters(params.clone(), &self.config.engine);
            let mut baseline = Agent::with_parameters(config.baseline.clone(), &self.config.engine);
            let match_config = MatchConfig {
                agent: self.config.agent,
                max_plies: self.config.max_plies,
                start_fen: self.config.start_fen.clone(),
                seed: self.seed,
                adjudication: config.adjudication,
                ..MatchConfig::default()
            };
            Some(play_match(&mut current, &mut baseline, config.games, &match_config)?)
        } else {
            None
        };

        let analysis = match analyst {
            Some(analyst) => match self.review_game(&params, analyst) {
                Ok(analysis) => Some(analysis),
                Err(TrainingError::OpponentUnavailable(reason)) => {
                    warn!("Game review skipped, analyst unavailable: {}", reason);
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let metrics = EvaluationMetrics {
            after_games: self.next_game,
            params_version: params.version,
            baseline,
            analysis,
        };
        if let Err(e) = sink.record_evaluation(&metrics) {
            warn!("Failed to record evaluation of v{}: {}", params.version, e);
        }
        Ok(metrics)
    }

    fn review_game(
        &self,
        params: &EvaluatorParameters,
        analyst: &mut dyn ReferenceOpponent,
    ) -> Result<GameAnalysis> {
        let start = start_position(self.config.start_fen.as_deref())?;
        let mut white = Agent::with_parameters(params.clone(), &self.config.engine);
        let mut black = Agent::with_parameters(params.clone(), &self.config.engine);
        let greedy = ExplorationConfig::disabled();

        let record = {
            let mut white = AgentPlayer::new(&mut white, self.config.agent, greedy, self.seed);
            let mut black = AgentPlayer::new(&mut black, self.config.agent, greedy, self.seed);
            play_game(&mut white, &mut black, &start, self.config.max_plies)?
        };
        analyze_game(&record, analyst, None)
    }

    /// Reference evaluations for a recorded game, when the update rule needs them.
    fn annotate(&mut self, record: &mut GameRecord) -> Result<()> {
        if self.config.update_rule != UpdateRule::Supervised {
            return Ok(());
        }
        let OpponentSource::VersusReference(reference) = &mut self.opponent else {
            return Ok(());
        };
        reference.new_game()?;
        for ply in &mut record.plies {
            ply.reference_eval = Some(reference.request_evaluation(&ply.board)?);
        }
        Ok(())
    }

    /// Learns from one finished game, reports it and checkpoints on the interval.
    fn absorb(
        &mut self,
        index: usize,
        record: &GameRecord,
        summary: &mut TrainingSummary,
        sink: &mut dyn MetricsSink,
    ) -> Result<()> {
        let metrics = self.learn(index, record)?;
        tally(summary, record, metrics.update);
        if let Err(e) = sink.record(&metrics) {
            warn!("Failed to record metrics for game {}: {}", metrics.game, e);
        }

        self.games_since_checkpoint += 1;
        let interval = self.config.checkpoint_interval;
        if interval > 0 && self.games_since_checkpoint >= interval {
            self.checkpoint();
        }
        Ok(())
    }

    fn finish(
        &mut self,
        mut summary: TrainingSummary,
        sink: &mut dyn MetricsSink,
    ) -> TrainingSummary {
        if self.games_since_checkpoint > 0 {
            self.checkpoint();
        }
        if let Err(e) = sink.flush() {
            warn!("Failed to flush metrics: {}", e);
        }

        summary.final_version = self.store.version();
        summary.last_checkpoint = self.last_checkpoint.clone();
        info!(
            "Training finished: {} games, {} skipped, {} updates applied, {} rejected, parameters v{}",
            summary.games_played,
            summary.games_skipped,
            summary.updates_applied,
            summary.updates_rejected,
            summary.final_version
        );
        summary
    }

    /// One game under the opponent failure policy. `None` when it was skipped.
    fn play_with_retries(&mut self, start: &Board, index: usize) -> Result<Option<GameRecord>> {
        let retries = match self.config.on_opponent_failure {
            OpponentFailurePolicy::Retry(n) => n,
            OpponentFailurePolicy::Skip => 0,
        };

        for attempt in 0..=retries {
            match self.play_one(start, index, attempt) {
                Ok(record) => return Ok(Some(record)),
                Err(TrainingError::OpponentUnavailable(reason)) => {
                    warn!(
                        "Game {} attempt {} failed, reference opponent unavailable: {}",
                        index,
                        attempt + 1,
                        reason
                    );
                }
                Err(e) => return Err(e),
            }
        }

        warn!("Skipping game {}", index);
        Ok(None)
    }

    fn play_one(&mut self, start: &Board, index: usize, attempt: u32) -> Result<GameRecord> {
        let seed = game_seed(self.seed, index).wrapping_add(u64::from(attempt) << 32);
        let Self {
            config,
            opponent,
            agent,
            sparring,
            ..
        } = self;

        match opponent {
            OpponentSource::SelfPlay => self_play_game(agent, sparring, config, start, seed),
            OpponentSource::VersusReference(reference) => {
                reference_game(agent, reference.as_mut(), config, start, index, seed)
            }
        }
    }

    /// Self-play games `first..first + count` in parallel against one frozen snapshot.
    fn play_parallel(
        &self,
        start: &Board,
        first: usize,
        count: usize,
    ) -> Result<Vec<Option<GameRecord>>> {
        let frozen = ParameterStore::shared((*self.store.snapshot()).clone());
        let config = &self.config;
        let seed = self.seed;
        debug!(
            "Playing games {}..{} in parallel on v{}",
            first,
            first + count,
            frozen.version()
        );

        (first..first + count)
            .into_par_iter()
            .map(|index| {
                let mut white = Agent::new(frozen.clone(), &config.engine);
                let mut black = Agent::new(frozen.clone(), &config.engine);
                self_play_game(&mut white, &mut black, config, start, game_seed(seed, index))
                    .map(Some)
            })
            .collect()
    }

    /// Fits the learned weights to `record` and publishes the result.
    fn learn(&mut self, index: usize, record: &GameRecord) -> Result<GameMetrics> {
        let snapshot = self.store.snapshot();
        let mut evaluator = ParametricEvaluator::fixed((*snapshot).clone());
        let samples = build_samples(record, self.config.update_rule, &mut evaluator);

        let (update, loss_before, loss_after, drift) = if samples.is_empty() {
            (UpdateStatus::NoSamples, None, None, 0.0)
        } else {
            match self.learner.fit(&samples) {
                Ok(report) => {
                    let drift = eval_drift(&samples, &snapshot.learned, &report.weights);
                    self.store.publish(snapshot.with_learned(report.weights));
                    (
                        UpdateStatus::Applied,
                        Some(report.loss_before),
                        Some(report.loss_after),
                        drift,
                    )
                }
                Err(TrainingError::DivergentUpdate { max_abs }) => {
                    error!(
                        "Game {}: divergent update rejected (max |w| = {}), keeping v{}",
                        index, max_abs, snapshot.version
                    );
                    let loss = self.learner.loss(&samples)?;
                    (UpdateStatus::Rejected, Some(loss), None, 0.0)
                }
                Err(e) => return Err(e),
            }
        };

        let metrics = GameMetrics {
            game: index,
            outcome: record.outcome,
            termination: record.termination,
            moves: record.len(),
            final_eval: record.final_eval(),
            eval_drift: drift,
            loss_before,
            loss_after,
            update,
            params_version: self.store.version(),
        };
        debug!(
            "Game {}: {} by {}, {} samples, update {}",
            index,
            record.outcome,
            record.termination,
            samples.len(),
            update
        );
        Ok(metrics)
    }

    fn checkpoint(&mut self) {
        let Some(checkpoints) = &self.checkpoints else {
            self.games_since_checkpoint = 0;
            return;
        };

        let params = self.store.snapshot();
        match checkpoints.save(&params) {
            Ok(handle) => {
                debug!("Checkpoint {} holds v{}", handle.version, params.version);
                self.last_checkpoint = Some(handle);
                self.games_since_checkpoint = 0;
            }
            Err(e) => error!("Failed to save checkpoint v{}: {}", params.version, e),
        }
    }
}

fn tally(summary: &mut TrainingSummary, record: &GameRecord, update: UpdateStatus) {
    summary.games_played += 1;
    match record.outcome {
        GameOutcome::WhiteWins => summary.white_wins += 1,
        GameOutcome::BlackWins => summary.black_wins += 1,
        GameOutcome::Draw => summary.draws += 1,
    }
    match update {
        UpdateStatus::Applied => summary.updates_applied += 1,
        UpdateStatus::Rejected => summary.updates_rejected += 1,
        UpdateStatus::NoSamples => {}
    }
}

fn game_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn self_play_game(
    white: &mut Agent,
    black: &mut Agent,
    config: &TrainerConfig,
    start: &Board,
    seed: u64,
) -> Result<GameRecord> {
    let mut white = AgentPlayer::new(white, config.agent, config.exploration, seed);
    let mut black = AgentPlayer::new(black, config.agent, config.exploration, seed ^ 1);
    play_game(&mut white, &mut black, start, config.max_plies)
}

/// The agent takes White in even games. Supervised updates also ask the
/// reference for an evaluation of every position played.
fn reference_game(
    agent: &mut Agent,
    opponent: &mut dyn ReferenceOpponent,
    config: &TrainerConfig,
    start: &Board,
    index: usize,
    seed: u64,
) -> Result<GameRecord> {
    let mut record = {
        let mut learner = AgentPlayer::new(agent, config.agent, config.exploration, seed);
        let mut reference = ReferencePlayer::new(&mut *opponent);
        if index % 2 == 0 {
            play_game(&mut learner, &mut reference, start, config.max_plies)?
        } else {
            play_game(&mut reference, &mut learner, start, config.max_plies)?
        }
    };

    if config.update_rule == UpdateRule::Supervised {
        for ply in &mut record.plies {
            ply.reference_eval = Some(opponent.request_evaluation(&ply.board)?);
        }
    }
    Ok(record)
}
