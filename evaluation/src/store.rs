use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::params::EvaluatorParameters;

/// The single shared home of the live evaluator parameters.
///
/// Readers take an `Arc` snapshot and keep using it for as long as they like;
/// the trainer publishes a whole new value with one atomic pointer swap,
/// so a reader sees either the old or the new set, never a mix.
pub struct ParameterStore {
    current: ArcSwap<EvaluatorParameters>,
}

impl ParameterStore {
    pub fn new(params: EvaluatorParameters) -> Self {
        Self {
            current: ArcSwap::from_pointee(params),
        }
    }

    pub fn shared(params: EvaluatorParameters) -> Arc<Self> {
        Arc::new(Self::new(params))
    }

    #[inline]
    pub fn snapshot(&self) -> Arc<EvaluatorParameters> {
        self.current.load_full()
    }

    pub fn version(&self) -> u32 {
        self.current.load().version
    }

    pub fn publish(&self, params: EvaluatorParameters) {
        self.current.store(Arc::new(params));
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(EvaluatorParameters::default())
    }
}
