use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use cozy_chess::util::parse_uci_move;
use cozy_chess::Board;
use evaluation::scores::{clamp_eval, mate_in};
use log::{debug, info, warn};
use utils::flip_eval_perspective;

use super::{ReferenceMove, ReferenceOpponent};
use crate::error::{Result, TrainingError};

#[derive(Debug, Clone)]
pub struct UciOpponentConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// `setoption` pairs sent after the handshake
    pub options: Vec<(String, String)>,
    /// Search depth for moves; `movetime` is used when unset
    pub move_depth: Option<u8>,
    pub movetime: Duration,
    /// Search depth for evaluations
    pub eval_depth: u8,
    /// Longest wait for any expected reply
    pub response_timeout: Duration,
}

impl Default for UciOpponentConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            args: Vec::new(),
            options: Vec::new(),
            move_depth: None,
            movetime: Duration::from_millis(100),
            eval_depth: 10,
            response_timeout: Duration::from_secs(10),
        }
    }
}

/// An external engine spoken to over UCI.
///
/// A process that dies or stops answering is dropped; the next game starts a new one.
pub struct UciOpponent {
    config: UciOpponentConfig,
    process: Option<EngineProcess>,
    name: String,
}

impl UciOpponent {
    pub fn spawn(config: UciOpponentConfig) -> Result<Self> {
        let (process, name) = EngineProcess::start(&config)?;
        info!("Reference engine {} ready", name);
        Ok(Self {
            config,
            process: Some(process),
            name,
        })
    }

    fn process(&mut self) -> Result<&mut EngineProcess> {
        let alive = self.process.as_mut().is_some_and(EngineProcess::is_alive);
        if !alive {
            warn!("Restarting reference engine {}", self.name);
            let (process, name) = EngineProcess::start(&self.config)?;
            self.name = name;
            self.process = Some(process);
        }
        self.process
            .as_mut()
            .ok_or_else(|| TrainingError::unavailable("engine process missing"))
    }

    /// Runs `request` against the process, dropping the process if it fails.
    fn with_process<T>(
        &mut self,
        request: impl FnOnce(&mut EngineProcess, &UciOpponentConfig) -> Result<T>,
    ) -> Result<T> {
        let config = self.config.clone();
        let result = request(self.process()?, &config);
        if result.is_err() {
            self.process = None;
        }
        result
    }
}

impl ReferenceOpponent for UciOpponent {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn new_game(&mut self) -> Result<()> {
        self.with_process(|process, config| {
            process.send("ucinewgame")?;
            process.send("isready")?;
            process.read_until("readyok", config.response_timeout)?;
            Ok(())
        })
    }

    fn request_move(&mut self, board: &Board) -> Result<ReferenceMove> {
        self.with_process(|process, config| {
            let go = match config.move_depth {
                Some(depth) => format!("go depth {}", depth),
                None => format!("go movetime {}", config.movetime.as_millis()),
            };
            let (bestmove, score) = process.search(board, &go, config)?;
            let token = bestmove
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| TrainingError::unavailable("empty bestmove"))?;
            let mv = parse_uci_move(board, token)
                .map_err(|_| TrainingError::unavailable(format!("unparsable move '{}'", token)))?;

            Ok(ReferenceMove {
                mv,
                white_eval: score.map(|s| flip_eval_perspective(board, s)),
            })
        })
    }

    fn request_evaluation(&mut self, board: &Board) -> Result<i16> {
        self.with_process(|process, config| {
            let go = format!("go depth {}", config.eval_depth);
            let (_, score) = process.search(board, &go, config)?;
            let score = score.ok_or_else(|| TrainingError::unavailable("no score reported"))?;
            Ok(flip_eval_perspective(board, score))
        })
    }
}

struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
}

impl EngineProcess {
    fn start(config: &UciOpponentConfig) -> Result<(Self, String)> {
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                TrainingError::unavailable(format!(
                    "cannot start {}: {}",
                    config.path.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TrainingError::unavailable("no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrainingError::unavailable("no stdout"))?;

        // Lines are forwarded by a reader thread so every wait can time out
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut process = Self {
            child,
            stdin: BufWriter::new(stdin),
            lines,
        };

        process.send("uci")?;
        let greeting = process.read_until("uciok", config.response_timeout)?;
        let name = greeting
            .iter()
            .find_map(|l| l.strip_prefix("id name "))
            .map(str::to_string)
            .unwrap_or_else(|| config.path.display().to_string());

        for (option, value) in &config.options {
            process.send(&format!("setoption name {} value {}", option, value))?;
        }
        process.send("isready")?;
        process.read_until("readyok", config.response_timeout)?;

        Ok((process, name))
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn send(&mut self, command: &str) -> Result<()> {
        debug!("uci > {}", command);
        writeln!(self.stdin, "{}", command)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| TrainingError::unavailable(format!("write failed: {}", e)))
    }

    /// Collects lines up to and including the first one starting with `token`.
    fn read_until(&mut self, token: &str, timeout: Duration) -> Result<Vec<String>> {
        let deadline = Instant::now() + timeout;
        let mut lines = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    let done = line.starts_with(token);
                    lines.push(line);
                    if done {
                        return Ok(lines);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TrainingError::unavailable(format!(
                        "no '{}' within {:?}",
                        token, timeout
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TrainingError::unavailable("engine process exited"))
                }
            }
        }
    }

    /// Runs one search; returns the `bestmove` line and the last side-to-move score.
    fn search(
        &mut self,
        board: &Board,
        go: &str,
        config: &UciOpponentConfig,
    ) -> Result<(String, Option<i16>)> {
        self.send(&format!("position fen {}", board))?;
        self.send(go)?;

        let mut lines = self.read_until("bestmove", config.response_timeout + config.movetime)?;
        let bestmove = lines.pop().unwrap_or_default();
        let score = lines.iter().rev().find_map(|l| parse_score(l));
        Ok((bestmove, score))
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if self.send("quit").is_ok() {
            // Give the engine a moment to quit gracefully
            thread::sleep(Duration::from_millis(50));
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Side-to-move score of an `info` line, in centipawns.
fn parse_score(line: &str) -> Option<i16> {
    if !line.starts_with("info") {
        return None;
    }
    let mut tokens = line.split_whitespace();
    tokens.find(|t| *t == "score")?;
    let kind = tokens.next()?;
    let value: i32 = tokens.next()?.parse().ok()?;
    match kind {
        "cp" => Some(clamp_eval(value)),
        "mate" if value > 0 => Some(mate_in((value * 2 - 1) as u16)),
        "mate" => Some(-mate_in((-value * 2) as u16)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::scores::EVAL_LIMIT;

    #[test]
    fn parses_centipawn_scores() {
        let line = "info depth 12 seldepth 18 multipv 1 score cp -37 nodes 4096 pv e7e5";
        assert_eq!(parse_score(line), Some(-37));
        assert_eq!(parse_score("info depth 3 score cp 99999"), Some(EVAL_LIMIT));
    }

    #[test]
    fn parses_mate_scores() {
        assert_eq!(parse_score("info depth 5 score mate 2 pv a1a8"), Some(mate_in(3)));
        assert_eq!(parse_score("info depth 5 score mate -1"), Some(-mate_in(2)));
    }

    #[test]
    fn ignores_lines_without_scores() {
        assert_eq!(parse_score("info string NNUE evaluation enabled"), None);
        assert_eq!(parse_score("bestmove e2e4 ponder e7e5"), None);
        assert_eq!(parse_score("info depth 4 score lowerbound"), None);
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let config = UciOpponentConfig {
            path: PathBuf::from("/nonexistent/reference-engine"),
            ..UciOpponentConfig::default()
        };
        assert!(matches!(
            UciOpponent::spawn(config),
            Err(TrainingError::OpponentUnavailable(_))
        ));
    }
}
