//! Move-by-move review of a finished game by a reference engine.

use cozy_chess::Color;
use log::debug;
use utils::rules::{self, Terminal};

use crate::error::Result;
use crate::game::GameRecord;
use crate::opponent::ReferenceOpponent;

pub const INACCURACY_CP: i32 = 20;
pub const MISTAKE_CP: i32 = 50;
pub const BLUNDER_CP: i32 = 100;

/// Evaluations are clamped to this before losses are taken, so that a missed
/// mate costs a bounded amount.
const LOSS_CAP_CP: i32 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameAnalysis {
    /// Moves reviewed
    pub moves: usize,
    /// Average centipawn loss over the reviewed moves
    pub acl: f32,
    pub inaccuracies: usize,
    pub mistakes: usize,
    pub blunders: usize,
    /// Moves matching the reference engine's choice
    pub perfect_moves: usize,
}

impl GameAnalysis {
    fn add(&mut self, loss: i32, perfect: bool) {
        self.moves += 1;
        // running mean
        self.acl += (loss as f32 - self.acl) / self.moves as f32;
        match loss {
            l if l > BLUNDER_CP => self.blunders += 1,
            l if l > MISTAKE_CP => self.mistakes += 1,
            l if l > INACCURACY_CP => self.inaccuracies += 1,
            _ => {}
        }
        if perfect {
            self.perfect_moves += 1;
        }
    }
}

/// Reviews the moves of `side`, or of both sides when `None`.
///
/// A move loses the gap between the reference's evaluation of the position
/// before it and of the position after it, from the mover's side.
pub fn analyze_game(
    record: &GameRecord,
    analyst: &mut dyn ReferenceOpponent,
    side: Option<Color>,
) -> Result<GameAnalysis> {
    analyst.new_game()?;
    let mut analysis = GameAnalysis::default();

    for ply in &record.plies {
        let mover = ply.board.side_to_move();
        if side.is_some_and(|s| s != mover) {
            continue;
        }

        let best = analyst.request_move(&ply.board)?;
        let before = match best.white_eval {
            Some(eval) => eval,
            None => analyst.request_evaluation(&ply.board)?,
        };

        let after_board = rules::apply(&ply.board, ply.mv);
        let after = match rules::terminal(&after_board) {
            // a mate delivered by the mover
            Some(Terminal::Checkmate) => match mover {
                Color::White => LOSS_CAP_CP,
                Color::Black => -LOSS_CAP_CP,
            },
            Some(_) => 0,
            None => i32::from(analyst.request_evaluation(&after_board)?),
        };

        let loss = (for_mover(i32::from(before), mover) - for_mover(after, mover)).max(0);
        analysis.add(loss, ply.mv == best.mv);
    }

    debug!(
        "analyzed {} moves: acl {:.1}, {} blunders, {} mistakes, {} inaccuracies",
        analysis.moves, analysis.acl, analysis.blunders, analysis.mistakes, analysis.inaccuracies
    );
    Ok(analysis)
}

fn for_mover(white_eval: i32, mover: Color) -> i32 {
    let capped = white_eval.clamp(-LOSS_CAP_CP, LOSS_CAP_CP);
    match mover {
        Color::White => capped,
        Color::Black => -capped,
    }
}
