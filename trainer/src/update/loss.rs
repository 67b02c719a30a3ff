use candle_core::{Result as CandleResult, Tensor};

/// Huber delta in value space.
const HUBER_DELTA: f64 = 0.5;

pub fn huber(pred: &Tensor, target: &Tensor) -> CandleResult<Tensor> {
    let diff = (pred - target)?;
    let abs_diff = diff.abs()?;

    let is_small = abs_diff.lt(HUBER_DELTA)?;

    let quadratic = (diff.sqr()? * 0.5)?;
    let linear = ((abs_diff - 0.5 * HUBER_DELTA)? * HUBER_DELTA)?;

    let loss = is_small.where_cond(&quadratic, &linear)?;
    loss.mean_all()
}
