pub mod checkpoint;
pub mod def;
pub mod features;
pub mod hce;
pub mod params;
pub mod piece_values;
pub mod scores;
pub mod store;

pub use checkpoint::{CheckpointError, CheckpointHandle, CheckpointStore};
pub use def::Evaluator;
pub use hce::ParametricEvaluator;
pub use params::{EvaluatorParameters, LearnedWeights, TermWeights};
pub use piece_values::PieceValues;
pub use store::ParameterStore;
