use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cozy_chess::Board;
use evaluation::{CheckpointStore, EvaluatorParameters, LearnedWeights, ParameterStore};
use quill::{Agent, AgentConfig};
use search::EngineConfig;
use trainer::{
    parse_pgn, play_match, CsvSink, EngineOpponent, EvaluationConfig, ExplorationConfig,
    GameMetrics, MatchConfig, MultiSink, OpponentFailurePolicy, OpponentSource, OptimizerConfig,
    ReferenceMove, ReferenceOpponent, Result, Trainer, TrainerConfig, TrainingError, UpdateRule,
    UpdateStatus,
};

/// White has a rook and three pawns against a bare king.
const IMBALANCED: &str = "4k3/8/8/8/8/8/PPP5/R3K3 w - - 0 1";

/// Black starts without a queen.
const QUEEN_ODDS: &str = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Index of the queen count among the learned features.
const QUEENS: usize = 4;

const RECORDED_GAMES: &str = r#"[Event "Casual"]
[Result "1-0"]

1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0

[Event "Casual"]
[Result "0-1"]

1. f3 e5 2. g4 Qh4# 0-1
"#;

fn quick_config() -> TrainerConfig {
    let mut engine = EngineConfig::default();
    engine.hash_size.value = 1;

    TrainerConfig {
        engine,
        agent: AgentConfig {
            depth_limit: Some(1),
            time_budget: None,
            randomize: None,
        },
        optimizer: OptimizerConfig {
            learning_rate: 0.001,
            steps_per_game: 8,
            ..OptimizerConfig::default()
        },
        max_plies: 24,
        checkpoint_interval: 0,
        seed: Some(11),
        ..TrainerConfig::default()
    }
}

fn toy_store() -> Arc<ParameterStore> {
    ParameterStore::shared(EvaluatorParameters::material_only())
}

fn engine_opponent() -> EngineOpponent {
    let mut config = EngineConfig::default();
    config.hash_size.value = 1;
    EngineOpponent::new(EvaluatorParameters::material_only(), &config, 1, 1)
}

/// Fails the first `failures` requests, then plays like a shallow engine.
struct FlakyOpponent {
    failures: usize,
    calls: Arc<AtomicUsize>,
    inner: EngineOpponent,
}

impl FlakyOpponent {
    fn new(failures: usize) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let opponent = Self {
            failures,
            calls: calls.clone(),
            inner: engine_opponent(),
        };
        (opponent, calls)
    }

    fn check(&mut self) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(TrainingError::OpponentUnavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ReferenceOpponent for FlakyOpponent {
    fn name(&self) -> String {
        "flaky".to_string()
    }

    fn request_move(&mut self, board: &Board) -> Result<ReferenceMove> {
        self.check()?;
        self.inner.request_move(board)
    }

    fn request_evaluation(&mut self, board: &Board) -> Result<i16> {
        self.inner.request_evaluation(board)
    }
}

/// Answers nothing at all.
struct UnreachableAnalyst;

impl ReferenceOpponent for UnreachableAnalyst {
    fn name(&self) -> String {
        "unreachable".to_string()
    }

    fn request_move(&mut self, _board: &Board) -> Result<ReferenceMove> {
        Err(TrainingError::OpponentUnavailable("no process".to_string()))
    }

    fn request_evaluation(&mut self, _board: &Board) -> Result<i16> {
        Err(TrainingError::OpponentUnavailable("no process".to_string()))
    }
}

#[test]
fn self_play_updates_and_publishes() {
    let store = toy_store();
    let mut trainer =
        Trainer::new(quick_config(), store.clone(), OpponentSource::SelfPlay, None).unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer.run_training(2, &mut metrics).unwrap();

    assert_eq!(summary.games_played, 2);
    assert_eq!(summary.games_skipped, 0);
    assert_eq!(summary.white_wins + summary.black_wins + summary.draws, 2);
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].game, 0);
    assert_eq!(metrics[1].game, 1);

    assert_eq!(summary.updates_applied, 2);
    assert_eq!(summary.final_version, 2);
    assert_eq!(store.version(), 2);
    for m in &metrics {
        assert_eq!(m.update, UpdateStatus::Applied);
        assert!(m.moves > 0);
        let (before, after) = (m.loss_before.unwrap(), m.loss_after.unwrap());
        assert!(after <= before + 1e-6, "loss grew from {} to {}", before, after);
    }
}

#[test]
fn training_reduces_loss_on_an_imbalanced_game() {
    let config = TrainerConfig {
        start_fen: Some(IMBALANCED.to_string()),
        exploration: ExplorationConfig::disabled(),
        ..quick_config()
    };
    let mut trainer = Trainer::new(config, toy_store(), OpponentSource::SelfPlay, None).unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    trainer.run_training(1, &mut metrics).unwrap();

    let m = &metrics[0];
    assert_eq!(m.update, UpdateStatus::Applied);
    assert!(m.loss_after.unwrap() < m.loss_before.unwrap());
    assert!(m.eval_drift > 0.0);
}

#[test]
fn divergent_update_is_rejected_and_training_continues() {
    let config = TrainerConfig {
        start_fen: Some(IMBALANCED.to_string()),
        optimizer: OptimizerConfig {
            learning_rate: 5.0,
            steps_per_game: 4,
            max_weight: 0.01,
            ..OptimizerConfig::default()
        },
        ..quick_config()
    };
    let store = toy_store();
    let before = store.snapshot();
    let mut trainer = Trainer::new(config, store.clone(), OpponentSource::SelfPlay, None).unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer.run_training(2, &mut metrics).unwrap();

    assert_eq!(summary.games_played, 2);
    assert_eq!(summary.updates_rejected, 2);
    assert_eq!(summary.updates_applied, 0);
    assert!(metrics.iter().all(|m| m.update == UpdateStatus::Rejected));
    assert_eq!(store.version(), before.version);
    assert_eq!(store.snapshot().learned, before.learned);
}

#[test]
fn failing_opponent_is_skipped_without_aborting() {
    let (opponent, calls) = FlakyOpponent::new(usize::MAX);
    let config = TrainerConfig {
        on_opponent_failure: OpponentFailurePolicy::Skip,
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::VersusReference(Box::new(opponent)),
        None,
    )
    .unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer.run_training(3, &mut metrics).unwrap();

    assert_eq!(summary.games_skipped, 3);
    assert_eq!(summary.games_played, 0);
    assert!(metrics.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(summary.final_version, 0);
}

#[test]
fn failing_opponent_is_retried() {
    let (opponent, calls) = FlakyOpponent::new(usize::MAX);
    let config = TrainerConfig {
        on_opponent_failure: OpponentFailurePolicy::Retry(2),
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::VersusReference(Box::new(opponent)),
        None,
    )
    .unwrap();

    let summary = trainer.run_training(2, &mut Vec::new()).unwrap();

    assert_eq!(summary.games_skipped, 2);
    // One request per attempt, three attempts per game
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[test]
fn opponent_recovering_on_retry_completes_the_game() {
    let (opponent, _calls) = FlakyOpponent::new(1);
    let config = TrainerConfig {
        on_opponent_failure: OpponentFailurePolicy::Retry(1),
        max_plies: 12,
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::VersusReference(Box::new(opponent)),
        None,
    )
    .unwrap();

    let summary = trainer.run_training(1, &mut Vec::new()).unwrap();
    assert_eq!(summary.games_played, 1);
    assert_eq!(summary.games_skipped, 0);
}

#[test]
fn supervised_updates_need_a_reference() {
    let config = TrainerConfig {
        update_rule: UpdateRule::Supervised,
        ..quick_config()
    };
    assert!(matches!(
        Trainer::new(config, toy_store(), OpponentSource::SelfPlay, None),
        Err(TrainingError::Config(_))
    ));
}

#[test]
fn supervised_updates_fit_reference_evaluations() {
    let config = TrainerConfig {
        update_rule: UpdateRule::Supervised,
        start_fen: Some(IMBALANCED.to_string()),
        max_plies: 8,
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::VersusReference(Box::new(engine_opponent())),
        None,
    )
    .unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer.run_training(1, &mut metrics).unwrap();

    assert_eq!(summary.games_played, 1);
    assert_eq!(metrics[0].update, UpdateStatus::Applied);
    assert!(metrics[0].loss_after.unwrap() <= metrics[0].loss_before.unwrap() + 1e-6);
}

#[test]
fn checkpoints_follow_the_interval() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainerConfig {
        checkpoint_interval: 1,
        ..quick_config()
    };
    let store = toy_store();
    let mut trainer = Trainer::new(
        config,
        store.clone(),
        OpponentSource::SelfPlay,
        Some(CheckpointStore::open(dir.path()).unwrap()),
    )
    .unwrap();

    let summary = trainer.run_training(2, &mut Vec::new()).unwrap();

    let checkpoints = CheckpointStore::open(dir.path()).unwrap();
    assert_eq!(checkpoints.versions().unwrap(), vec![0, 1]);
    assert_eq!(summary.last_checkpoint, checkpoints.latest().unwrap());

    let (loaded, handle) = checkpoints.load_latest();
    assert!(handle.is_some());
    assert_eq!(loaded, *store.snapshot());
}

#[test]
fn final_checkpoint_is_written_at_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainerConfig {
        checkpoint_interval: 10,
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::SelfPlay,
        Some(CheckpointStore::open(dir.path()).unwrap()),
    )
    .unwrap();

    trainer.run_training(1, &mut Vec::new()).unwrap();
    assert_eq!(
        CheckpointStore::open(dir.path()).unwrap().versions().unwrap(),
        vec![0]
    );
}

#[test]
fn stop_flag_ends_training_early() {
    let mut trainer =
        Trainer::new(quick_config(), toy_store(), OpponentSource::SelfPlay, None).unwrap();
    trainer.stop_handle().store(true, Ordering::Relaxed);

    let summary = trainer.run_training(5, &mut Vec::new()).unwrap();
    assert!(summary.stopped_early);
    assert_eq!(summary.games_played, 0);
}

#[test]
fn parallel_self_play_plays_every_game() {
    let config = TrainerConfig {
        parallel_games: 3,
        max_plies: 12,
        ..quick_config()
    };
    let store = toy_store();
    let mut trainer = Trainer::new(config, store.clone(), OpponentSource::SelfPlay, None).unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer.run_training(4, &mut metrics).unwrap();

    assert_eq!(summary.games_played, 4);
    let games: Vec<usize> = metrics.iter().map(|m| m.game).collect();
    assert_eq!(games, vec![0, 1, 2, 3]);
    assert_eq!(store.version() as usize, summary.updates_applied);
}

#[test]
fn baseline_match_alternates_colors() {
    let mut engine = EngineConfig::default();
    engine.hash_size.value = 1;
    let mut a = Agent::with_parameters(EvaluatorParameters::default(), &engine);
    let mut b = Agent::with_parameters(EvaluatorParameters::material_only(), &engine);

    let config = MatchConfig {
        agent: AgentConfig {
            depth_limit: Some(1),
            time_budget: None,
            randomize: None,
        },
        max_plies: 16,
        ..MatchConfig::default()
    };
    let score = play_match(&mut a, &mut b, 2, &config).unwrap();

    assert_eq!(score.games(), 2);
    assert!((0.0..=1.0).contains(&score.score()));
}

#[test]
fn same_seed_replays_the_same_training() {
    let run = |parallel_games: usize| {
        let config = TrainerConfig {
            parallel_games,
            max_plies: 16,
            ..quick_config()
        };
        let store = toy_store();
        let mut trainer =
            Trainer::new(config, store.clone(), OpponentSource::SelfPlay, None).unwrap();
        let mut metrics: Vec<GameMetrics> = Vec::new();
        trainer.run_training(3, &mut metrics).unwrap();
        (metrics, store.snapshot().learned)
    };

    assert_eq!(run(1), run(1));
    assert_eq!(run(3), run(3));
}

#[test]
fn training_from_bad_weights_improves_against_the_baseline() {
    // a checkpoint may score this much below the previous one
    const TOLERANCE: f32 = 0.25;

    let mut learned = LearnedWeights::default();
    // a queen worth a pawn and a half
    learned.0[QUEENS] = -8.0;
    let store = ParameterStore::shared(EvaluatorParameters::material_only().with_learned(learned));

    let config = TrainerConfig {
        update_rule: UpdateRule::Supervised,
        start_fen: Some(QUEEN_ODDS.to_string()),
        max_plies: 40,
        optimizer: OptimizerConfig {
            learning_rate: 0.05,
            steps_per_game: 8,
            ..OptimizerConfig::default()
        },
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        store.clone(),
        OpponentSource::VersusReference(Box::new(engine_opponent())),
        None,
    )
    .unwrap();
    let evaluation = EvaluationConfig {
        games: 4,
        ..EvaluationConfig::default()
    };

    let mut scores = Vec::new();
    let mut queen_weights = Vec::new();
    for checkpoint in 0..4 {
        if checkpoint > 0 {
            let mut metrics: Vec<GameMetrics> = Vec::new();
            let summary = trainer.run_training(3, &mut metrics).unwrap();
            assert_eq!(summary.updates_applied, 3);
        }
        let mut sink: Vec<GameMetrics> = Vec::new();
        let measured = trainer.evaluate(&evaluation, None, &mut sink).unwrap();
        let baseline = measured.baseline.unwrap();
        assert_eq!(baseline.games(), 4);

        scores.push(baseline.score());
        queen_weights.push(store.snapshot().learned.0[QUEENS]);
    }

    for pair in queen_weights.windows(2) {
        assert!(pair[1] > pair[0], "queen weight went {:?}", queen_weights);
    }
    for pair in scores.windows(2) {
        assert!(
            pair[1] >= pair[0] - TOLERANCE,
            "baseline score went {:?}",
            scores
        );
    }
    assert!(scores[scores.len() - 1] >= scores[0], "baseline score went {:?}", scores);
}

#[test]
fn recorded_games_train_without_playing() {
    let games = parse_pgn(RECORDED_GAMES);
    assert_eq!(games.len(), 2);

    let config = TrainerConfig {
        update_rule: UpdateRule::TemporalDifference { lambda: 1.0 },
        ..quick_config()
    };
    let store = toy_store();
    let mut trainer = Trainer::new(config, store.clone(), OpponentSource::SelfPlay, None).unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer.train_on_games(&games, &mut metrics).unwrap();

    assert_eq!(summary.games_played, 2);
    assert_eq!(summary.white_wins, 1);
    assert_eq!(summary.black_wins, 1);
    assert_eq!(summary.updates_applied, 2);
    assert_eq!(store.version(), 2);
    assert_eq!(metrics[0].moves, 7);
    assert_eq!(metrics[1].moves, 4);
}

#[test]
fn recorded_games_take_reference_evaluations() {
    let config = TrainerConfig {
        update_rule: UpdateRule::Supervised,
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::VersusReference(Box::new(engine_opponent())),
        None,
    )
    .unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer
        .train_on_games(&parse_pgn(RECORDED_GAMES), &mut metrics)
        .unwrap();

    assert_eq!(summary.games_played, 2);
    assert!(metrics.iter().all(|m| m.update == UpdateStatus::Applied));
}

#[test]
fn recorded_games_are_skipped_when_the_reference_fails() {
    let config = TrainerConfig {
        update_rule: UpdateRule::Supervised,
        ..quick_config()
    };
    let mut trainer = Trainer::new(
        config,
        toy_store(),
        OpponentSource::VersusReference(Box::new(UnreachableAnalyst)),
        None,
    )
    .unwrap();

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let summary = trainer
        .train_on_games(&parse_pgn(RECORDED_GAMES), &mut metrics)
        .unwrap();
    assert_eq!(summary.games_skipped, 2);
    assert_eq!(summary.games_played, 0);
}

#[test]
fn evaluation_reviews_a_game_and_reaches_the_csv() {
    let dir = tempfile::tempdir().unwrap();
    let games = dir.path().join("metrics.csv");
    let evaluations = dir.path().join("metrics.evaluation.csv");

    let config = TrainerConfig {
        max_plies: 12,
        ..quick_config()
    };
    let mut trainer = Trainer::new(config, toy_store(), OpponentSource::SelfPlay, None).unwrap();
    let mut sink = MultiSink::new().with(
        CsvSink::open(&games)
            .unwrap()
            .with_evaluations(&evaluations)
            .unwrap(),
    );
    trainer.run_training(1, &mut sink).unwrap();

    let mut analyst = engine_opponent();
    let evaluation = EvaluationConfig {
        games: 2,
        ..EvaluationConfig::default()
    };
    let measured = trainer
        .evaluate(&evaluation, Some(&mut analyst), &mut sink)
        .unwrap();

    assert_eq!(measured.after_games, 1);
    assert_eq!(measured.baseline.unwrap().games(), 2);
    assert!(measured.baseline.unwrap().plies > 0);
    let review = measured.analysis.unwrap();
    assert!(review.moves > 0 && review.moves <= 12);
    assert!(review.acl >= 0.0);
    assert!(review.perfect_moves <= review.moves);

    let text = std::fs::read_to_string(&evaluations).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains(&format!(",1,{},", measured.params_version)));
}

#[test]
fn evaluation_survives_an_unreachable_analyst() {
    let mut trainer =
        Trainer::new(quick_config(), toy_store(), OpponentSource::SelfPlay, None).unwrap();
    let evaluation = EvaluationConfig {
        games: 0,
        ..EvaluationConfig::default()
    };

    let mut metrics: Vec<GameMetrics> = Vec::new();
    let measured = trainer
        .evaluate(&evaluation, Some(&mut UnreachableAnalyst), &mut metrics)
        .unwrap();
    assert_eq!(measured.baseline, None);
    assert_eq!(measured.analysis, None);
}
