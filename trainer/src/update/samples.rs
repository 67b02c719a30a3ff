use evaluation::features::{learned_term, FeatureVector, LEARNED_UNIT_CP};
use evaluation::{LearnedWeights, ParametricEvaluator};
use utils::{game_phase, Position};

use super::targets::{td_lambda, value_of};
use crate::config::UpdateRule;
use crate::game::GameRecord;

/// One training position: the fixed handcrafted part, the features the learned
/// weights act on, and the value to fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Handcrafted centipawns, White-positive
    pub heuristic: f32,
    pub features: FeatureVector,
    /// Target in [-1, 1], White's point of view
    pub target: f32,
}

/// Training samples for every recorded position of `record`.
///
/// `evaluator` must hold the parameters the game was played with. Supervised
/// targets need `reference_eval`; positions without one are skipped.
pub fn build_samples(
    record: &GameRecord,
    rule: UpdateRule,
    evaluator: &mut ParametricEvaluator,
) -> Vec<Sample> {
    let learned = evaluator.parameters().learned;

    let mut decomposed = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());
    for ply in &record.plies {
        let position = Position::new(&ply.board);
        let (heuristic, features) = evaluator.decompose(&position, game_phase(&ply.board));
        let static_eval = heuristic as f32 + learned_term(&features, &learned);

        values.push(value_of(ply.eval.map_or(static_eval, f32::from)));
        decomposed.push((heuristic as f32, features));
    }

    match rule {
        UpdateRule::TemporalDifference { lambda } => {
            let targets = td_lambda(&values, record.outcome.white_score(), lambda);
            decomposed
                .into_iter()
                .zip(targets)
                .map(|((heuristic, features), target)| Sample {
                    heuristic,
                    features,
                    target,
                })
                .collect()
        }
        UpdateRule::Supervised => decomposed
            .into_iter()
            .zip(&record.plies)
            .filter_map(|((heuristic, features), ply)| {
                ply.reference_eval.map(|cp| Sample {
                    heuristic,
                    features,
                    target: value_of(cp as f32),
                })
            })
            .collect(),
    }
}

/// Mean absolute change in static evaluation, in centipawns, caused by
/// replacing `before` with `after` on the sampled positions.
pub fn eval_drift(samples: &[Sample], before: &LearnedWeights, after: &LearnedWeights) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: f32 = samples
        .iter()
        .map(|s| {
            let delta: f32 = s
                .features
                .iter()
                .zip(after.0.iter().zip(before.0.iter()))
                .map(|(f, (a, b))| f * (a - b))
                .sum();
            (delta * LEARNED_UNIT_CP).abs()
        })
        .sum();
    total / samples.len() as f32
}
