use utils::Position;

/// Static position evaluator.
pub trait Evaluator: Send {
    fn name(&self) -> String;

    /// Evaluate position from White's perspective. Positive = White advantage.
    /// Never called on terminal positions.
    fn evaluate(&mut self, position: &Position, phase: f32) -> i16;

    /// Pick up the most recently published parameters.
    /// Called between searches so one search never mixes two parameter sets.
    /// Returns true if the parameters changed.
    fn refresh(&mut self) -> bool {
        false
    }
}
