//! Compact feature vector behind the learned evaluation term.
//!
//! Every feature is White minus Black, so the learned term keeps the
//! evaluator's White-positive convention and flips sign on a color mirror.

use cozy_chess::{BitBoard, Color, Piece};
use utils::Position;

use crate::hce::{passed_pawns, shield_pawns, weak_pawns};
use crate::params::LearnedWeights;

pub const NUM_FEATURES: usize = 12;

/// Centipawns contributed by a weight of 1.0 on a feature value of 1.0.
pub const LEARNED_UNIT_CP: f32 = 100.0;

pub type FeatureVector = [f32; NUM_FEATURES];

pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "pawns",
    "knights",
    "bishops",
    "rooks",
    "queens",
    "mobility",
    "center_control",
    "undeveloped_minors",
    "king_pressure",
    "passed_pawns",
    "weak_pawns",
    "king_shelter",
];

// d4, e4, d5, e5
const CENTER: BitBoard = BitBoard(0x0000_0018_1800_0000);
// b1, c1, f1, g1 and their Black counterparts
const HOME_MINORS: [BitBoard; Color::NUM] = [
    BitBoard(0x0000_0000_0000_0066),
    BitBoard(0x6600_0000_0000_0000),
];

const COUNTED: [Piece; 5] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
];

pub fn extract(position: &Position) -> FeatureVector {
    let board = position.board;
    let mut f = [0.0f32; NUM_FEATURES];

    for (color, sign) in [(Color::White, 1.0f32), (Color::Black, -1.0f32)] {
        for (i, piece) in COUNTED.into_iter().enumerate() {
            f[i] += sign * board.colored_pieces(color, piece).len() as f32;
        }

        f[5] += sign * position.space_for(color) as f32 / 10.0;
        f[6] += sign * (position.attacks_for(color) & CENTER).len() as f32;

        let minors =
            board.colored_pieces(color, Piece::Knight) | board.colored_pieces(color, Piece::Bishop);
        f[7] += sign * (minors & HOME_MINORS[color as usize]).len() as f32;

        f[8] += sign * position.king_zone_attacks_for(color) as f32 / 4.0;

        let ours = board.colored_pieces(color, Piece::Pawn);
        let theirs = board.colored_pieces(!color, Piece::Pawn);
        f[9] += sign * passed_pawns(ours, theirs, color).len() as f32;
        f[10] += sign * weak_pawns(ours) as f32;

        let (r1, r2) = shield_pawns(board, color);
        f[11] += sign * (r1 + r2) as f32 / 3.0;
    }

    f
}

/// Learned contribution in centipawns.
#[inline(always)]
pub fn learned_term(features: &FeatureVector, weights: &LearnedWeights) -> f32 {
    let dot: f32 = features
        .iter()
        .zip(weights.0.iter())
        .map(|(f, w)| f * w)
        .sum();
    dot * LEARNED_UNIT_CP
}
