// Score bounds and special values for alpha-beta search.
pub const SCORE_INF: i16 = 30_000;
/// Base value for checkmate. Actual mate scores are MATE_VALUE - ply to distinguish faster mates.
pub const MATE_VALUE: i16 = SCORE_INF - 1000;
/// Anything beyond this magnitude is a mate score.
pub const MATE_SCORE_BOUND: i16 = MATE_VALUE - 1000;
/// Static evaluations are clamped to this range, below every mate score.
pub const EVAL_LIMIT: i16 = 20_000;

/// Score for delivering mate `plies` half-moves from the root.
#[inline(always)]
pub const fn mate_in(plies: u16) -> i16 {
    MATE_VALUE - plies as i16
}

#[inline(always)]
pub const fn is_mate_score(score: i16) -> bool {
    score.abs() >= MATE_SCORE_BOUND
}

/// Plies until mate, if the score encodes one. Negative when being mated.
#[inline(always)]
pub fn mate_distance(score: i16) -> Option<i16> {
    if !is_mate_score(score) {
        return None;
    }
    let plies = MATE_VALUE - score.abs();
    Some(if score > 0 { plies } else { -plies })
}

#[inline(always)]
pub fn clamp_eval(score: i32) -> i16 {
    score.clamp(-(EVAL_LIMIT as i32), EVAL_LIMIT as i32) as i16
}
