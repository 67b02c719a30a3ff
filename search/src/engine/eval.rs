use cozy_chess::Board;
use utils::{cap_eval_by_material, flip_eval_perspective, game_phase, Position};

use super::Engine;

impl Engine {
    /// White-positive evaluation, capped when a side cannot win.
    pub(super) fn white_eval(&mut self, board: &Board) -> i16 {
        let phase = game_phase(board);
        let position = Position::new(board);
        let score = self.evaluator.evaluate(&position, phase);
        cap_eval_by_material(board, score)
    }

    /// Evaluation from the side to move's point of view.
    pub(super) fn eval(&mut self, board: &Board) -> i16 {
        let score = self.white_eval(board);
        flip_eval_perspective(board, score)
    }

    /// Picks up newly published parameters. Cached static evaluations belong to
    /// the old parameters, so the table goes with them.
    pub(super) fn refresh_evaluator(&mut self) {
        if self.evaluator.refresh() {
            self.tt.clear();
        }
    }
}
