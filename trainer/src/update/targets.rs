/// Centipawn scale of the value squashing: a position `VALUE_SCALE_CP` up is worth tanh(1).
pub const VALUE_SCALE_CP: f32 = 400.0;

/// Expected result in [-1, 1] of a centipawn score.
#[inline]
pub fn value_of(cp: f32) -> f32 {
    (cp / VALUE_SCALE_CP).tanh()
}

/// TD(λ) returns for positions `0..values.len()` of a game with result `outcome`.
///
/// `values[t]` is the estimate of position `t`; the position after the last move
/// is worth exactly `outcome`. Then `G_t = (1 - λ) v_{t+1} + λ G_{t+1}`.
pub fn td_lambda(values: &[f32], outcome: f32, lambda: f32) -> Vec<f32> {
    let lambda = lambda.clamp(0.0, 1.0);
    let mut targets = vec![0.0; values.len()];

    let mut next_return = outcome;
    let mut next_value = outcome;
    for t in (0..values.len()).rev() {
        let target = (1.0 - lambda) * next_value + lambda * next_return;
        targets[t] = target;
        next_return = target;
        next_value = values[t];
    }
    targets
}
