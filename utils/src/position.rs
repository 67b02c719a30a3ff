use cozy_chess::{BitBoard, Board, Color};
use std::cell::OnceCell;

use crate::board_metrics::BoardMetrics;

/// A board plus lazily computed attack metrics, shared by all evaluation terms
/// of a single `evaluate` call.
pub struct Position<'a> {
    pub board: &'a Board,
    metrics: OnceCell<BoardMetrics>,
}

impl<'a> Position<'a> {
    #[inline(always)]
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            metrics: OnceCell::new(),
        }
    }

    #[inline(always)]
    fn metrics(&self) -> &BoardMetrics {
        self.metrics.get_or_init(|| BoardMetrics::new(self.board))
    }

    #[inline(always)]
    pub fn space_for(&self, color: Color) -> i16 {
        self.metrics().space[color as usize]
    }

    #[inline(always)]
    pub fn attacks_for(&self, color: Color) -> BitBoard {
        self.metrics().attacks[color as usize]
    }

    #[inline(always)]
    pub fn king_zone_attacks_for(&self, color: Color) -> i16 {
        self.metrics().king_zone_attacks[color as usize]
    }
}
