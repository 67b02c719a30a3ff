use cozy_chess::Board;
use evaluation::{EvaluatorParameters, ParametricEvaluator};
use search::{Engine, EngineConfig, SearchError};
use utils::flip_eval_perspective;

use super::{ReferenceMove, ReferenceOpponent};
use crate::error::{Result, TrainingError};

/// In-process oracle: a deeper search over a frozen parameter set.
pub struct EngineOpponent {
    engine: Engine,
    move_depth: u8,
    eval_depth: u8,
}

impl EngineOpponent {
    pub fn new(
        params: EvaluatorParameters,
        config: &EngineConfig,
        move_depth: u8,
        eval_depth: u8,
    ) -> Self {
        Self {
            engine: Engine::new(config, Box::new(ParametricEvaluator::fixed(params))),
            move_depth,
            eval_depth,
        }
    }

    fn search(&mut self, board: &Board, depth: u8) -> Result<(ReferenceMove, i16)> {
        let result = self
            .engine
            .search_position(board, Some(depth), None)
            .map_err(|e| match e {
                SearchError::NoLegalMoves(terminal) => {
                    TrainingError::unavailable(format!("asked to move in a {} position", terminal))
                }
                other => TrainingError::unavailable(other),
            })?;
        let white_eval = flip_eval_perspective(board, result.score);
        Ok((
            ReferenceMove {
                mv: result.best_move,
                white_eval: Some(white_eval),
            },
            white_eval,
        ))
    }
}

impl ReferenceOpponent for EngineOpponent {
    fn name(&self) -> String {
        format!("{} depth {}", self.engine.name(), self.move_depth)
    }

    fn new_game(&mut self) -> Result<()> {
        self.engine.new_game();
        Ok(())
    }

    fn request_move(&mut self, board: &Board) -> Result<ReferenceMove> {
        self.search(board, self.move_depth).map(|(reply, _)| reply)
    }

    fn request_evaluation(&mut self, board: &Board) -> Result<i16> {
        self.search(board, self.eval_depth).map(|(_, eval)| eval)
    }
}
