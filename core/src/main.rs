mod args;

use std::error::Error;
use std::fs::File;
use std::time::Duration;

use args::Args;
use clap::Parser;
use cozy_chess::{util::display_uci_move, Board};
use evaluation::{CheckpointStore, EvaluatorParameters};
use log::{info, LevelFilter};
use quill::{Agent, AgentConfig, Randomize};
use search::EngineConfig;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut engine_config = EngineConfig::default();
    for option in &args.options {
        let (name, value) = option
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", option))?;
        engine_config.set(name.trim(), value.trim())?;
    }
    for line in engine_config.describe() {
        log::debug!("option {}", line);
    }

    let mut agent = match &args.checkpoints {
        Some(dir) => Agent::from_checkpoints(&CheckpointStore::open(dir)?, &engine_config).0,
        None => Agent::with_parameters(EvaluatorParameters::default(), &engine_config),
    };

    let board = match &args.fen {
        Some(fen) => fen
            .parse::<Board>()
            .map_err(|e| format!("invalid FEN '{}': {:?}", fen, e))?,
        None => Board::default(),
    };

    let config = AgentConfig {
        depth_limit: args.depth,
        time_budget: args.movetime.map(Duration::from_millis),
        randomize: args.top_k.map(|top_k| Randomize {
            top_k,
            margin: args.margin,
        }),
    };

    let decision = agent.decide(&board, Default::default(), &config)?;
    info!(
        "{} searched {} nodes to depth {}{}",
        agent.name(),
        decision.nodes,
        decision.depth,
        if decision.timed_out { " (timed out)" } else { "" }
    );

    println!(
        "bestmove {} score cp {}",
        display_uci_move(&board, decision.mv),
        decision.score
    );
    Ok(())
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(log_file) = &args.log_file {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        ));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
