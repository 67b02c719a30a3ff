mod player;
mod record;

pub use player::{AgentPlayer, PlayedMove, Player, ReferencePlayer};
pub use record::{GameRecord, RecordedPly, Termination};

use ahash::{AHashMap, AHashSet};
use cozy_chess::{Board, Color};
use log::debug;
use utils::{rules, GameOutcome};

use crate::error::{Result, TrainingError};

/// Parses the configured start position, defaulting to the standard one.
pub fn start_position(fen: Option<&str>) -> Result<Board> {
    match fen {
        Some(fen) => fen
            .parse::<Board>()
            .map_err(|e| TrainingError::Config(format!("invalid FEN '{}': {:?}", fen, e))),
        None => Ok(Board::default()),
    }
}

/// Plays one game to the end.
///
/// Ends on checkmate, stalemate, the fifty-move rule, insufficient material,
/// the third occurrence of a position, or after `max_plies` (adjudicated draw).
pub fn play_game(
    white: &mut dyn Player,
    black: &mut dyn Player,
    start: &Board,
    max_plies: usize,
) -> Result<GameRecord> {
    white.new_game()?;
    black.new_game()?;

    let mut board = start.clone();
    let mut occurrences: AHashMap<u64, u8> = AHashMap::new();
    occurrences.insert(rules::hash(&board), 1);
    let mut plies = Vec::new();

    let termination = loop {
        if let Some(terminal) = rules::terminal(&board) {
            break Termination::from(terminal);
        }
        let hash = rules::hash(&board);
        if occurrences.get(&hash).copied().unwrap_or(0) >= 3 {
            break Termination::ThreefoldRepetition;
        }
        if plies.len() >= max_plies {
            break Termination::MoveLimit;
        }

        let history: AHashSet<u64> = occurrences
            .keys()
            .copied()
            .filter(|&h| h != hash)
            .collect();

        let player: &mut dyn Player = match board.side_to_move() {
            Color::White => &mut *white,
            Color::Black => &mut *black,
        };
        let played = player.play(&board, &history, plies.len())?;

        let next = rules::apply(&board, played.mv);
        *occurrences.entry(rules::hash(&next)).or_insert(0) += 1;
        plies.push(RecordedPly {
            board,
            mv: played.mv,
            eval: played.white_eval,
            reference_eval: None,
        });
        board = next;
    };

    let outcome = match termination {
        Termination::Checkmate => GameOutcome::win_for(!board.side_to_move()),
        _ => GameOutcome::Draw,
    };
    debug!(
        "{} vs {}: {} by {} after {} plies",
        white.name(),
        black.name(),
        outcome,
        termination,
        plies.len()
    );

    Ok(GameRecord {
        plies,
        final_board: board,
        outcome,
        termination,
    })
}
