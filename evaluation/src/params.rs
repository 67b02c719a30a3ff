use crate::features::NUM_FEATURES;
use crate::hce::PieceSquareTables;
use crate::piece_values::PieceValues;

macro_rules! define_terms {
    ($($(#[$doc:meta])* $name:ident: $default:expr,)*) => {
        /// Centipawn weights of the handcrafted evaluation terms.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct TermWeights {
            $($(#[$doc])* pub $name: i16,)*
        }

        impl Default for TermWeights {
            fn default() -> Self {
                Self { $($name: $default,)* }
            }
        }

        impl TermWeights {
            pub const NAMES: &'static [&'static str] = &[$(stringify!($name),)*];
            pub const LEN: usize = Self::NAMES.len();

            pub fn zeroed() -> Self {
                Self { $($name: 0,)* }
            }

            pub fn to_vec(&self) -> Vec<f32> {
                vec![$(self.$name as f32,)*]
            }

            pub fn from_slice(values: &[f32]) -> Option<Self> {
                if values.len() != Self::LEN {
                    return None;
                }
                let mut it = values.iter();
                Some(Self { $($name: it.next()?.round() as i16,)* })
            }
        }
    };
}

define_terms! {
    // Pawn structure
    doubled_pawn_penalty: 30,
    tripled_pawn_penalty: 60,
    isolated_pawn_penalty: 25,
    backward_pawn_penalty: 12,
    backward_pawn_half_open_penalty: 8,
    /// Linear part of the passed pawn bonus, per rank advanced
    passed_pawn_linear: 7,
    /// Quadratic part, (rank - 1)^2
    passed_pawn_quadratic: 3,
    center_pawn_bonus: 15,

    // Pieces
    bishop_pair_bonus: 50,
    rook_open_file_bonus: 15,
    rook_semi_open_file_bonus: 10,
    rook_seventh_rank_bonus: 20,
    knight_mobility: 5,
    bishop_mobility: 3,
    rook_mobility: 3,
    queen_mobility: 1,

    // King safety
    king_shield_r1_bonus: 12,
    king_shield_r2_bonus: 6,
    king_open_file_penalty: 24,
    king_semi_open_file_penalty: 12,
    king_thin_cover_penalty: 6,
    /// Per enemy attack on the squares around the king
    king_pressure: 10,
    king_central_penalty: 20,
    king_activity_bonus: 14,
}

/// Weights of the learned linear term, one per feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnedWeights(pub [f32; NUM_FEATURES]);

impl Default for LearnedWeights {
    fn default() -> Self {
        Self([0.0; NUM_FEATURES])
    }
}

impl LearnedWeights {
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|w| w.is_finite())
    }

    pub fn max_abs(&self) -> f32 {
        self.0.iter().fold(0.0, |acc, w| acc.max(w.abs()))
    }
}

/// Everything the evaluator reads. Immutable once published; updates build a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorParameters {
    pub version: u32,
    pub piece_values: PieceValues,
    pub terms: TermWeights,
    pub pst: PieceSquareTables,
    pub learned: LearnedWeights,
}

impl Default for EvaluatorParameters {
    fn default() -> Self {
        Self {
            version: 0,
            piece_values: PieceValues::default(),
            terms: TermWeights::default(),
            pst: PieceSquareTables::default(),
            learned: LearnedWeights::default(),
        }
    }
}

impl EvaluatorParameters {
    /// Material counting only. Used as the toy evaluator and as a fixed baseline.
    pub fn material_only() -> Self {
        Self {
            terms: TermWeights::zeroed(),
            pst: PieceSquareTables::zeroed(),
            ..Self::default()
        }
    }

    /// Successor with new learned weights and a bumped version.
    pub fn with_learned(&self, learned: LearnedWeights) -> Self {
        Self {
            version: self.version.wrapping_add(1),
            learned,
            ..self.clone()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.learned.is_finite()
            && self.piece_values.to_array().iter().all(|v| v.is_finite())
            && self.pst.to_vec().iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_weights_round_trip() {
        let terms = TermWeights::default();
        let restored = TermWeights::from_slice(&terms.to_vec()).unwrap();
        assert_eq!(terms, restored);
        assert_eq!(terms.to_vec().len(), TermWeights::LEN);
        assert!(TermWeights::from_slice(&[1.0]).is_none());
    }

    #[test]
    fn with_learned_bumps_version_only() {
        let params = EvaluatorParameters::default();
        let mut weights = LearnedWeights::default();
        weights.0[3] = 0.25;
        let next = params.with_learned(weights);
        assert_eq!(next.version, params.version + 1);
        assert_eq!(next.terms, params.terms);
        assert_eq!(next.learned.0[3], 0.25);
    }

    #[test]
    fn non_finite_weights_detected() {
        let mut weights = LearnedWeights::default();
        weights.0[0] = f32::NAN;
        assert!(!EvaluatorParameters::default().with_learned(weights).is_finite());
        assert!(EvaluatorParameters::default().is_finite());
    }
}
