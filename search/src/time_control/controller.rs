use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::SearchLimits;

// Assumes the next iteration takes ~2x longer than the previous.
const NEXT_ITERATION_DURATION_FACTOR: u32 = 2;

/// Decides how deep to iterate and when a running iteration must give up.
///
/// The deadline and the external stop flag are only acted upon once depth 1 has
/// completed, so a search always has a move to return.
pub struct SearchController {
    start_time: Instant,
    time_budget: Option<Duration>,
    max_depth: u8,
    stop: Arc<AtomicBool>,
    armed: bool,
    halted: bool,
    last_iteration_duration: Option<Duration>,
    current_iteration_start: Option<Duration>,
}

impl SearchController {
    pub fn new(limits: &SearchLimits, default_depth: u8, max_depth: u8, stop: Arc<AtomicBool>) -> Self {
        let depth = match (limits.depth, limits.time) {
            (Some(depth), _) => depth,
            (None, Some(_)) => max_depth,
            (None, None) => default_depth,
        };

        Self {
            start_time: Instant::now(),
            time_budget: limits.time,
            max_depth: depth.clamp(1, max_depth),
            stop,
            armed: false,
            halted: false,
            last_iteration_duration: None,
            current_iteration_start: None,
        }
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn should_continue_to_next_depth(&self, next_depth: u8) -> bool {
        if next_depth > self.max_depth {
            return false;
        }
        // Always allow the first iteration regardless of time
        if next_depth <= 1 {
            return true;
        }
        if self.halted || self.stop.load(Ordering::Relaxed) {
            return false;
        }

        if let Some(budget) = self.time_budget {
            let elapsed = self.elapsed();
            if elapsed >= budget {
                return false;
            }
            // Skip an iteration that is predicted to overrun the budget
            if let Some(last) = self.last_iteration_duration {
                if elapsed + last * NEXT_ITERATION_DURATION_FACTOR > budget {
                    return false;
                }
            }
        }

        true
    }

    /// Polled at every node. Sticky once it returns true.
    #[inline(always)]
    pub fn should_stop(&mut self) -> bool {
        if self.halted {
            return true;
        }
        if !self.armed {
            return false;
        }

        let deadline_passed = self
            .time_budget
            .is_some_and(|budget| self.start_time.elapsed() >= budget);
        if deadline_passed || self.stop.load(Ordering::Relaxed) {
            self.halted = true;
        }
        self.halted
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Total elapsed time since search started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn on_iteration_start(&mut self) {
        self.current_iteration_start = Some(self.elapsed());
    }

    pub fn on_iteration_complete(&mut self) {
        if let Some(start) = self.current_iteration_start.take() {
            self.last_iteration_duration = Some(self.elapsed().saturating_sub(start));
        }
        self.armed = true;
    }
}
