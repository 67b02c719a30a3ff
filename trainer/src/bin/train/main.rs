mod args;
mod progress;

use std::error::Error;
use std::sync::atomic::Ordering;
use std::time::Duration;

use args::{Args, Mode};
use clap::Parser;
use evaluation::features::FEATURE_NAMES;
use evaluation::{CheckpointStore, ParameterStore};
use log::LevelFilter;
use progress::ProgressSink;
use quill::AgentConfig;
use simplelog::{Config, SimpleLogger};
use trainer::{
    load_pgn, CsvSink, EvaluationConfig, MultiSink, OpponentSource, ReferenceOpponent, Trainer,
    TrainerConfig, UciOpponent, UciOpponentConfig, UpdateRule,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;

    let checkpoints = CheckpointStore::open(&args.checkpoints)?;
    let (params, handle) = checkpoints.load_latest();
    match &handle {
        Some(handle) => log::info!("Resuming from {}", handle.path.display()),
        None => log::info!("No checkpoint found, starting from default parameters"),
    }
    let store = ParameterStore::shared(params);

    let opponent = match args.mode {
        Mode::SelfPlay => OpponentSource::SelfPlay,
        Mode::Reference | Mode::Supervised => OpponentSource::VersusReference(Box::new(
            UciOpponent::spawn(reference_config(&args))?,
        )),
    };
    let mut analyst = if args.analyze {
        Some(UciOpponent::spawn(reference_config(&args))?)
    } else {
        None
    };
    let database = match &args.pgn {
        Some(path) => Some(load_pgn(path)?),
        None => None,
    };
    let total = database
        .as_ref()
        .map_or(args.games, |games| games.len().min(args.games));

    let mut trainer = Trainer::new(trainer_config(&args), store, opponent, Some(checkpoints))?;

    let stop_flag = trainer.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("Received SIGINT, stopping after the current game...");
        stop_flag.store(true, Ordering::Relaxed);
    })?;

    let progress = ProgressSink::new(total)?;
    let bar = progress.bar();
    let mut sink = MultiSink::new().with(progress);
    if let Some(path) = &args.metrics {
        let evaluations = path.with_extension("evaluation.csv");
        log::info!(
            "Writing metrics to {} and {}",
            path.display(),
            evaluations.display()
        );
        sink = sink.with(CsvSink::open(path)?.with_evaluations(&evaluations)?);
    }

    let evaluation = EvaluationConfig {
        games: args.baseline_games,
        ..EvaluationConfig::default()
    };
    let chunk = if args.checkpoint_interval == 0 {
        total
    } else {
        args.checkpoint_interval
    };
    let mut played = 0;
    while played < total {
        let count = chunk.min(total - played);
        let summary = match &database {
            Some(games) => trainer.train_on_games(&games[played..played + count], &mut sink)?,
            None => trainer.run_training(count, &mut sink)?,
        };
        played += count;

        if args.baseline_games > 0 || analyst.is_some() {
            let analyst = analyst.as_mut().map(|a| a as &mut dyn ReferenceOpponent);
            trainer.evaluate(&evaluation, analyst, &mut sink)?;
        }

        if summary.stopped_early {
            break;
        }
    }
    bar.finish();

    let params = trainer.store().snapshot();
    log::info!("Learned weights after v{}:", params.version);
    for (name, weight) in FEATURE_NAMES.iter().zip(params.learned.0.iter()) {
        log::info!("  {:<20} {:+.4}", name, weight);
    }

    Ok(())
}

fn reference_config(args: &Args) -> UciOpponentConfig {
    UciOpponentConfig {
        path: args.reference.clone(),
        move_depth: args.reference_depth,
        movetime: Duration::from_millis(args.reference_movetime),
        ..UciOpponentConfig::default()
    }
}

fn trainer_config(args: &Args) -> TrainerConfig {
    let defaults = TrainerConfig::default();
    let mut config = TrainerConfig {
        agent: AgentConfig {
            depth_limit: Some(args.depth),
            time_budget: args.movetime.map(Duration::from_millis),
            randomize: None,
        },
        update_rule: match args.mode {
            Mode::Supervised => UpdateRule::Supervised,
            Mode::SelfPlay | Mode::Reference => UpdateRule::TemporalDifference {
                lambda: args.lambda,
            },
        },
        max_plies: args.max_plies,
        checkpoint_interval: args.checkpoint_interval,
        parallel_games: args.parallel.unwrap_or_else(num_cpus::get),
        seed: args.seed,
        ..defaults
    };
    config.optimizer.learning_rate = args.learning_rate;
    config
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    SimpleLogger::init(LevelFilter::Info, Config::default())?;

    Ok(args)
}
