mod context;
mod eval_king;
mod eval_material;
mod eval_pawns;
mod eval_pieces;
mod pawn_cache;
mod pst;

pub(crate) use eval_king::shield_pawns;
pub(crate) use eval_pawns::{passed_pawns, weak_pawns};
pub use pst::PieceSquareTables;

use context::EvalContext;
use cozy_chess::Color;
use pawn_cache::{CachedPawnEvaluation, PawnCache};
use std::sync::Arc;
use utils::Position;

use crate::def::Evaluator;
use crate::features::{self, FeatureVector};
use crate::params::EvaluatorParameters;
use crate::scores::clamp_eval;
use crate::store::ParameterStore;

/// Handcrafted terms plus the learned linear term, driven by a parameter snapshot.
pub struct ParametricEvaluator {
    store: Arc<ParameterStore>,
    params: Arc<EvaluatorParameters>,
    pawn_cache: PawnCache,
}

impl ParametricEvaluator {
    pub fn new(store: Arc<ParameterStore>) -> Self {
        let params = store.snapshot();
        Self {
            store,
            params,
            pawn_cache: PawnCache::new(),
        }
    }

    /// Evaluator pinned to one parameter set, e.g. a frozen baseline.
    pub fn fixed(params: EvaluatorParameters) -> Self {
        Self::new(ParameterStore::shared(params))
    }

    pub fn parameters(&self) -> &Arc<EvaluatorParameters> {
        &self.params
    }

    /// Handcrafted part only, White-positive.
    pub fn heuristic(&mut self, position: &Position, phase: f32) -> i32 {
        let ctx = EvalContext::new(position, phase);
        let board = position.board;
        let params = &*self.params;
        let terms = &params.terms;

        let mut cp: i32 = 0;

        cp += eval_material::evaluate(&ctx, Color::White, params) as i32;
        cp -= eval_material::evaluate(&ctx, Color::Black, params) as i32;

        let pawns = match self.pawn_cache.get(board, phase) {
            Some(cached) => cached,
            None => {
                let entry = CachedPawnEvaluation {
                    white: eval_pawns::evaluate(board, Color::White, phase, terms),
                    black: eval_pawns::evaluate(board, Color::Black, phase, terms),
                };
                self.pawn_cache.set(board, phase, entry);
                entry
            }
        };
        cp += pawns.white as i32 - pawns.black as i32;

        cp += eval_pieces::evaluate(&ctx, Color::White, terms) as i32;
        cp -= eval_pieces::evaluate(&ctx, Color::Black, terms) as i32;

        cp += eval_king::evaluate(&ctx, Color::White, terms) as i32;
        cp -= eval_king::evaluate(&ctx, Color::Black, terms) as i32;

        cp
    }

    /// The two inputs of the learned term: handcrafted score and feature vector.
    pub fn decompose(&mut self, position: &Position, phase: f32) -> (i32, FeatureVector) {
        (self.heuristic(position, phase), features::extract(position))
    }
}

impl Evaluator for ParametricEvaluator {
    fn name(&self) -> String {
        format!("parametric-v{}", self.params.version)
    }

    fn evaluate(&mut self, position: &Position, phase: f32) -> i16 {
        let heuristic = self.heuristic(position, phase);
        let learned = features::learned_term(&features::extract(position), &self.params.learned);
        clamp_eval(heuristic + learned.round() as i32)
    }

    fn refresh(&mut self) -> bool {
        let latest = self.store.snapshot();
        if Arc::ptr_eq(&latest, &self.params) {
            return false;
        }
        self.params = latest;
        // pawn weights may have changed
        self.pawn_cache.clear();
        true
    }
}
