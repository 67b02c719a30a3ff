use evaluation::scores::MATE_VALUE;

// Mate Distance Pruning (MDP)
//
// Adjusts alpha-beta bounds based on the maximum possible mate score at current ply.
// Returns true if the search can be pruned immediately.
//
// A mate found at ply P is at least P plies from root, so:
// - Best possible score: MATE_VALUE - ply (mate-in-P)
// - Worst possible score: -(MATE_VALUE - ply) (mated-in-P)
#[inline(always)]
pub fn mate_distance_prune(alpha: &mut i16, beta: &mut i16, ply: u8) -> bool {
    let mate_in_ply = MATE_VALUE - ply as i16;

    *alpha = (*alpha).max(-mate_in_ply);
    *beta = (*beta).min(mate_in_ply);

    *alpha >= *beta
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::scores::SCORE_INF;

    #[test]
    fn prunes_when_shorter_mate_already_known() {
        // A mate in 3 is already secured; nothing at ply 5 can beat it
        let mut alpha = MATE_VALUE - 3;
        let mut beta = SCORE_INF;
        assert!(mate_distance_prune(&mut alpha, &mut beta, 5));
    }

    #[test]
    fn clamps_full_window() {
        let mut alpha = -SCORE_INF;
        let mut beta = SCORE_INF;
        assert!(!mate_distance_prune(&mut alpha, &mut beta, 2));
        assert_eq!(alpha, -(MATE_VALUE - 2));
        assert_eq!(beta, MATE_VALUE - 2);
    }
}
