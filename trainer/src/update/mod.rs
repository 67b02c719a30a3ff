//! Turning finished games into new learned weights.

mod learner;
mod loss;
mod samples;
mod targets;

pub use learner::{Learner, UpdateReport};
pub use samples::{build_samples, eval_drift, Sample};
pub use targets::{td_lambda, value_of, VALUE_SCALE_CP};
