use evaluation::scores::SCORE_INF;

#[derive(PartialEq, Debug)]
pub enum Pass {
    Hit(i16),
    FailLow,
    FailHigh,
}

/// Manages aspiration window bounds across search iterations.
/// Starts with a narrow window around the previous score, widens on fail-low/fail-high.
///
/// <https://www.chessprogramming.org/Aspiration_Windows>
#[derive(Copy, Clone)]
pub struct AspirationWindow {
    alpha: i16,
    beta: i16,
    start_half: i16,
    widen: i16,
    enabled_from: u8,
}

impl AspirationWindow {
    pub fn new(start_half: i16, widen: i16, enabled_from: u8) -> Self {
        Self {
            alpha: -SCORE_INF,
            beta: SCORE_INF,
            start_half,
            widen,
            enabled_from,
        }
    }

    /// Sets up window for new depth based on previous score.
    pub fn begin_depth(&mut self, depth: u8, prev_score: i16) {
        if depth < self.enabled_from {
            self.alpha = -SCORE_INF;
            self.beta = SCORE_INF;
            return;
        }

        let half = (self.start_half + 10 * depth as i16).min(SCORE_INF);
        self.alpha = clamp_bound(prev_score as i32 - half as i32);
        self.beta = clamp_bound(prev_score as i32 + half as i32);
    }

    pub fn bounds(&self) -> (i16, i16) {
        (self.alpha, self.beta)
    }

    /// Checks score against bounds; widens window on failure.
    pub fn analyse_pass(&mut self, score: i16) -> Pass {
        if score > self.alpha && score < self.beta {
            return Pass::Hit(score);
        }
        if score <= self.alpha {
            // fail-low: widen only the low side
            let span = (self.beta as i32 - score as i32).abs().max(self.start_half as i32)
                * self.widen as i32;
            self.alpha = clamp_bound(score as i32 - span);
            Pass::FailLow
        } else {
            // fail-high
            let span = (score as i32 - self.alpha as i32).abs().max(self.start_half as i32)
                * self.widen as i32;
            self.beta = clamp_bound(score as i32 + span);
            Pass::FailHigh
        }
    }

    /// Opens the low side only, used when a near-best root move came back as a bound.
    pub fn open_low(&mut self) {
        self.alpha = -SCORE_INF;
    }

    /// Fully opens the window after too many failures.
    pub fn fully_extend(&mut self) {
        self.alpha = -SCORE_INF;
        self.beta = SCORE_INF;
    }
}

#[inline(always)]
fn clamp_bound(value: i32) -> i16 {
    value.clamp(-(SCORE_INF as i32), SCORE_INF as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_window_below_enabled_depth() {
        let mut window = AspirationWindow::new(40, 2, 5);
        window.begin_depth(3, 120);
        assert_eq!(window.bounds(), (-SCORE_INF, SCORE_INF));
    }

    #[test]
    fn fail_low_widens_only_alpha() {
        let mut window = AspirationWindow::new(40, 2, 1);
        window.begin_depth(5, 0);
        let (alpha, beta) = window.bounds();
        assert_eq!((alpha, beta), (-90, 90));

        assert_eq!(window.analyse_pass(-200), Pass::FailLow);
        let (new_alpha, new_beta) = window.bounds();
        assert!(new_alpha < -200);
        assert_eq!(new_beta, beta);

        assert_eq!(window.analyse_pass(-150), Pass::Hit(-150));
    }

    #[test]
    fn fail_high_widens_only_beta() {
        let mut window = AspirationWindow::new(40, 2, 1);
        window.begin_depth(5, 0);
        assert_eq!(window.analyse_pass(90), Pass::FailHigh);
        let (alpha, beta) = window.bounds();
        assert_eq!(alpha, -90);
        assert!(beta > 90);
    }
}
