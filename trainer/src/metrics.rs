use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;
use log::info;
use utils::GameOutcome;

use crate::analysis::GameAnalysis;
use crate::arena::MatchScore;
use crate::game::Termination;

/// What happened to the learned weights after a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Applied,
    /// Divergent update thrown away, previous parameters kept
    Rejected,
    NoSamples,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateStatus::Applied => "applied",
            UpdateStatus::Rejected => "rejected",
            UpdateStatus::NoSamples => "no-samples",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameMetrics {
    pub game: usize,
    pub outcome: GameOutcome,
    pub termination: Termination,
    pub moves: usize,
    /// Last search score of the game, White's point of view
    pub final_eval: i16,
    /// Mean |Δ static eval| in centipawns caused by this game's update
    pub eval_drift: f32,
    pub loss_before: Option<f32>,
    pub loss_after: Option<f32>,
    pub update: UpdateStatus,
    /// Parameter version after the update
    pub params_version: u32,
}

/// A periodic measurement of the parameters between training games.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// Training games started before the evaluation
    pub after_games: usize,
    pub params_version: u32,
    /// Match against the fixed baseline, from the trained side
    pub baseline: Option<MatchScore>,
    /// Reference review of a greedy self-play game
    pub analysis: Option<GameAnalysis>,
}

pub trait MetricsSink {
    fn record(&mut self, metrics: &GameMetrics) -> io::Result<()>;

    fn record_evaluation(&mut self, _metrics: &EvaluationMetrics) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every record in memory.
impl MetricsSink for Vec<GameMetrics> {
    fn record(&mut self, metrics: &GameMetrics) -> io::Result<()> {
        self.push(metrics.clone());
        Ok(())
    }
}

/// One log line per game.
pub struct LogSink;

impl MetricsSink for LogSink {
    fn record(&mut self, m: &GameMetrics) -> io::Result<()> {
        info!(
            "game {} {} by {} in {} moves, eval {}, update {} (v{}), loss {} -> {}, drift {:.1}cp",
            m.game,
            m.outcome,
            m.termination,
            m.moves,
            m.final_eval,
            m.update,
            m.params_version,
            format_loss(m.loss_before),
            format_loss(m.loss_after),
            m.eval_drift
        );
        Ok(())
    }

    fn record_evaluation(&mut self, m: &EvaluationMetrics) -> io::Result<()> {
        if let Some(score) = &m.baseline {
            info!(
                "v{} after {} games vs baseline: {}, {:.1} plies per game",
                m.params_version,
                m.after_games,
                score,
                score.average_plies()
            );
        }
        if let Some(a) = &m.analysis {
            info!(
                "v{} review: acl {:.1}, {} blunders, {} mistakes, {} inaccuracies, {}/{} best moves",
                m.params_version,
                a.acl,
                a.blunders,
                a.mistakes,
                a.inaccuracies,
                a.perfect_moves,
                a.moves
            );
        }
        Ok(())
    }
}

const CSV_HEADER: &str = "timestamp,game,outcome,termination,moves,final_eval,eval_drift,loss_before,loss_after,update,params_version";
const EVALUATION_CSV_HEADER: &str = "timestamp,after_games,params_version,wins,draws,losses,score,average_plies,acl,blunders,mistakes,inaccuracies,perfect_moves,reviewed_moves";

/// Appends one CSV row per game, and one per evaluation when given a second file.
/// Each header is written once, for a new file.
pub struct CsvSink {
    writer: BufWriter<File>,
    evaluations: Option<BufWriter<File>>,
}

impl CsvSink {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            writer: open_appending(path.as_ref(), CSV_HEADER)?,
            evaluations: None,
        })
    }

    /// Evaluation rows go to `path`.
    pub fn with_evaluations(mut self, path: impl AsRef<Path>) -> io::Result<Self> {
        self.evaluations = Some(open_appending(path.as_ref(), EVALUATION_CSV_HEADER)?);
        Ok(self)
    }
}

fn open_appending(path: &Path, header: &str) -> io::Result<BufWriter<File>> {
    let is_new = std::fs::metadata(path).map_or(true, |m| m.len() == 0);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    if is_new {
        writeln!(writer, "{}", header)?;
    }
    Ok(writer)
}

impl MetricsSink for CsvSink {
    fn record(&mut self, m: &GameMetrics) -> io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{:.3},{},{},{},{}",
            Local::now().to_rfc3339(),
            m.game,
            m.outcome,
            m.termination,
            m.moves,
            m.final_eval,
            m.eval_drift,
            format_loss(m.loss_before),
            format_loss(m.loss_after),
            m.update,
            m.params_version
        )?;
        self.writer.flush()
    }

    fn record_evaluation(&mut self, m: &EvaluationMetrics) -> io::Result<()> {
        let Some(writer) = &mut self.evaluations else {
            return Ok(());
        };

        let baseline = m.baseline.map_or_else(
            || "-,-,-,-,-".to_string(),
            |s| {
                format!(
                    "{},{},{},{:.3},{:.1}",
                    s.wins,
                    s.draws,
                    s.losses,
                    s.score(),
                    s.average_plies()
                )
            },
        );
        let analysis = m.analysis.map_or_else(
            || "-,-,-,-,-,-".to_string(),
            |a| {
                format!(
                    "{:.1},{},{},{},{},{}",
                    a.acl, a.blunders, a.mistakes, a.inaccuracies, a.perfect_moves, a.moves
                )
            },
        );
        writeln!(
            writer,
            "{},{},{},{},{}",
            Local::now().to_rfc3339(),
            m.after_games,
            m.params_version,
            baseline,
            analysis
        )?;
        writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(writer) = &mut self.evaluations {
            writer.flush()?;
        }
        self.writer.flush()
    }
}

/// Forwards every record to several sinks.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn MetricsSink + Send>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl MetricsSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl MetricsSink for MultiSink {
    fn record(&mut self, metrics: &GameMetrics) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.record(metrics)?;
        }
        Ok(())
    }

    fn record_evaluation(&mut self, metrics: &EvaluationMetrics) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.record_evaluation(metrics)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

fn format_loss(loss: Option<f32>) -> String {
    loss.map_or_else(|| "-".to_string(), |l| format!("{:.5}", l))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(game: usize) -> GameMetrics {
        GameMetrics {
            game,
            outcome: GameOutcome::WhiteWins,
            termination: Termination::Checkmate,
            moves: 41,
            final_eval: 28_990,
            eval_drift: 3.25,
            loss_before: Some(0.125),
            loss_after: Some(0.1),
            update: UpdateStatus::Applied,
            params_version: 7,
        }
    }

    #[test]
    fn csv_appends_rows_under_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.record(&metrics(0)).unwrap();
        drop(sink);

        let mut sink = CsvSink::open(&path).unwrap();
        sink.record(&metrics(1)).unwrap();
        drop(sink);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[2].ends_with(",1,1-0,checkmate,41,28990,3.250,0.12500,0.10000,applied,7"));
    }

    #[test]
    fn multi_sink_forwards_to_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        let mut sink = MultiSink::new()
            .with(LogSink)
            .with(CsvSink::open(&path).unwrap());
        sink.record(&metrics(0)).unwrap();
        sink.flush().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn evaluations_are_written_next_to_game_rows() {
        let dir = tempfile::tempdir().unwrap();
        let games = dir.path().join("metrics.csv");
        let evaluations = dir.path().join("metrics.evaluation.csv");

        let mut sink = MultiSink::new().with(
            CsvSink::open(&games)
                .unwrap()
                .with_evaluations(&evaluations)
                .unwrap(),
        );
        sink.record(&metrics(0)).unwrap();
        sink.record_evaluation(&EvaluationMetrics {
            after_games: 50,
            params_version: 50,
            baseline: Some(MatchScore {
                wins: 6,
                draws: 2,
                losses: 2,
                plies: 800,
            }),
            analysis: None,
        })
        .unwrap();
        sink.record_evaluation(&EvaluationMetrics {
            after_games: 100,
            params_version: 98,
            baseline: None,
            analysis: Some(GameAnalysis {
                moves: 40,
                acl: 31.3,
                inaccuracies: 5,
                mistakes: 2,
                blunders: 1,
                perfect_moves: 17,
            }),
        })
        .unwrap();

        assert_eq!(std::fs::read_to_string(&games).unwrap().lines().count(), 2);

        let text = std::fs::read_to_string(&evaluations).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], EVALUATION_CSV_HEADER);
        assert!(lines[1].ends_with(",50,50,6,2,2,0.700,80.0,-,-,-,-,-,-"));
        assert!(lines[2].ends_with(",100,98,-,-,-,-,-,31.3,1,2,5,17,40"));
    }

    #[test]
    fn evaluations_without_a_file_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.record_evaluation(&EvaluationMetrics {
            after_games: 1,
            params_version: 1,
            baseline: Some(MatchScore::default()),
            analysis: None,
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{}\n", CSV_HEADER));
    }
}
