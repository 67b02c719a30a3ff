use cozy_chess::{Color, Move, Square};

use super::utils::apply_gravity;
use crate::{EngineConfig, MAX_DEPTH};

const NUM_SQUARES: usize = Square::NUM;
// [color][from][to]
const HISTORY_SIZE: usize = Color::NUM * NUM_SQUARES * NUM_SQUARES;

/// Scores quiet moves by how often they caused a beta cutoff.
#[derive(Clone)]
pub struct HistoryHeuristic {
    history: Vec<i16>,

    max_history: i32,
    bonus_multiplier: i32,
    malus_multiplier: i32,
}

impl HistoryHeuristic {
    pub fn new(max_history: i32, bonus_multiplier: i32, malus_multiplier: i32) -> Self {
        Self {
            history: vec![0; HISTORY_SIZE],

            max_history: max_history.max(1),
            bonus_multiplier,
            malus_multiplier,
        }
    }

    pub fn configure(&mut self, config: &EngineConfig) {
        self.max_history = config.history_max_value.value.max(1);
        self.bonus_multiplier = config.history_bonus_multiplier.value;
        self.malus_multiplier = config.history_malus_multiplier.value;

        self.reset();
    }

    pub fn matches_config(&self, config: &EngineConfig) -> bool {
        self.max_history == config.history_max_value.value
            && self.bonus_multiplier == config.history_bonus_multiplier.value
            && self.malus_multiplier == config.history_malus_multiplier.value
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.history.fill(0);
    }

    #[inline(always)]
    pub fn get(&self, color: Color, mv: Move) -> i16 {
        self.history[Self::index(color, mv.from, mv.to)]
    }

    #[inline(always)]
    pub fn update(&mut self, color: Color, mv: Move, delta: i32) {
        let idx = Self::index(color, mv.from, mv.to);
        apply_gravity(&mut self.history[idx], delta, self.max_history);
    }

    #[inline(always)]
    fn index(color: Color, source: Square, dest: Square) -> usize {
        let color_stride = NUM_SQUARES * NUM_SQUARES;
        color as usize * color_stride + source as usize * NUM_SQUARES + dest as usize
    }

    #[inline(always)]
    pub fn get_bonus(&self, remaining_depth: u8) -> i32 {
        let d = remaining_depth.min(MAX_DEPTH as u8) as i32;
        self.bonus_multiplier * d * d
    }

    #[inline(always)]
    pub fn get_malus(&self, remaining_depth: u8) -> i32 {
        -self.malus_multiplier * remaining_depth.min(MAX_DEPTH as u8) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    #[test]
    fn bonus_and_malus_move_entries_apart() {
        let mut history = HistoryHeuristic::new(512, 13, 4);
        let good = mv(Square::G1, Square::F3);
        let bad = mv(Square::B1, Square::A3);

        history.update(Color::White, good, history.get_bonus(4));
        history.update(Color::White, bad, history.get_malus(4));

        assert!(history.get(Color::White, good) > 0);
        assert!(history.get(Color::White, bad) < 0);
        assert_eq!(history.get(Color::Black, good), 0);
    }

    #[test]
    fn configure_resets_table() {
        let mut history = HistoryHeuristic::new(512, 13, 4);
        let m = mv(Square::E2, Square::E4);
        history.update(Color::White, m, 100);

        let config = EngineConfig::default();
        history.configure(&config);
        assert!(history.matches_config(&config));
        assert_eq!(history.get(Color::White, m), 0);
    }
}
