use std::fmt;

use cozy_chess::{Board, Color, Piece};
use log::debug;
use quill::{Agent, AgentConfig};
use utils::GameOutcome;

use crate::config::ExplorationConfig;
use crate::error::Result;
use crate::game::{play_game, start_position, AgentPlayer, GameRecord, Termination};

/// Pawn, knight, bishop, rook, queen.
const ADJUDICATION_VALUES: [i32; 5] = [100, 300, 300, 500, 900];

/// Result of a match from the first agent's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchScore {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    /// Plies played over all games
    pub plies: u32,
}

impl MatchScore {
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// Points per game, a draw counting half.
    pub fn score(&self) -> f32 {
        match self.games() {
            0 => 0.0,
            n => (self.wins as f32 + 0.5 * self.draws as f32) / n as f32,
        }
    }

    pub fn average_plies(&self) -> f32 {
        match self.games() {
            0 => 0.0,
            n => self.plies as f32 / n as f32,
        }
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{} ={} -{} ({:.1}%)",
            self.wins,
            self.draws,
            self.losses,
            self.score() * 100.0
        )
    }
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub agent: AgentConfig,
    /// Opening randomization, so that repeated games differ
    pub exploration: ExplorationConfig,
    pub max_plies: usize,
    pub start_fen: Option<String>,
    pub seed: u64,
    /// Material lead in centipawns that wins a game cut off by `max_plies`.
    /// `None` scores every such game as a draw.
    pub adjudication: Option<i32>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig {
                depth_limit: Some(2),
                time_budget: None,
                randomize: None,
            },
            exploration: ExplorationConfig::default(),
            max_plies: 200,
            start_fen: None,
            seed: 0,
            adjudication: None,
        }
    }
}

/// Plays `games` games between `a` and `b`, alternating colors, `a` White first.
pub fn play_match(
    a: &mut Agent,
    b: &mut Agent,
    games: usize,
    config: &MatchConfig,
) -> Result<MatchScore> {
    let start = start_position(config.start_fen.as_deref())?;
    let mut score = MatchScore::default();

    for game in 0..games {
        let seed = config.seed.wrapping_add(2 * game as u64);
        let mut first = AgentPlayer::new(&mut *a, config.agent, config.exploration, seed);
        let mut second =
            AgentPlayer::new(&mut *b, config.agent, config.exploration, seed.wrapping_add(1));

        let a_is_white = game % 2 == 0;
        let record = if a_is_white {
            play_game(&mut first, &mut second, &start, config.max_plies)?
        } else {
            play_game(&mut second, &mut first, &start, config.max_plies)?
        };

        score.plies += record.len() as u32;
        match (adjudicate(&record, config.adjudication), a_is_white) {
            (GameOutcome::Draw, _) => score.draws += 1,
            (GameOutcome::WhiteWins, true) | (GameOutcome::BlackWins, false) => score.wins += 1,
            _ => score.losses += 1,
        }
        debug!("match game {}: {} ({})", game, record.outcome, score);
    }

    Ok(score)
}

fn adjudicate(record: &GameRecord, margin: Option<i32>) -> GameOutcome {
    match (record.termination, margin) {
        (Termination::MoveLimit, Some(margin)) => {
            let balance = material_balance(&record.final_board);
            if balance >= margin {
                GameOutcome::WhiteWins
            } else if balance <= -margin {
                GameOutcome::BlackWins
            } else {
                GameOutcome::Draw
            }
        }
        _ => record.outcome,
    }
}

/// Standard material count, White minus Black.
fn material_balance(board: &Board) -> i32 {
    Piece::ALL
        .iter()
        .zip(ADJUDICATION_VALUES)
        .map(|(&piece, value)| {
            let white = board.colored_pieces(Color::White, piece).len() as i32;
            let black = board.colored_pieces(Color::Black, piece).len() as i32;
            (white - black) * value
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_counts_draws_as_half() {
        let score = MatchScore {
            wins: 3,
            draws: 2,
            losses: 1,
            plies: 300,
        };
        assert_eq!(score.games(), 6);
        assert!((score.score() - 4.0 / 6.0).abs() < 1e-6);
        assert_eq!(score.average_plies(), 50.0);
        assert_eq!(MatchScore::default().score(), 0.0);
    }

    fn cut_off(fen: &str) -> GameRecord {
        GameRecord {
            plies: Vec::new(),
            final_board: fen.parse().unwrap(),
            outcome: GameOutcome::Draw,
            termination: Termination::MoveLimit,
        }
    }

    #[test]
    fn material_lead_decides_games_cut_off_by_the_ply_limit() {
        // Black is a rook up
        let record = cut_off("r3k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(adjudicate(&record, None), GameOutcome::Draw);
        assert_eq!(adjudicate(&record, Some(300)), GameOutcome::BlackWins);
        assert_eq!(adjudicate(&record, Some(600)), GameOutcome::Draw);

        let finished = GameRecord {
            termination: Termination::ThreefoldRepetition,
            ..record
        };
        assert_eq!(adjudicate(&finished, Some(300)), GameOutcome::Draw);
    }
}
