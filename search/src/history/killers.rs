use cozy_chess::Move;

use crate::MAX_DEPTH;

/// Quiet moves that caused beta cutoffs, two per ply, most recent first.
///
/// <https://www.chessprogramming.org/Killer_Heuristic>
pub struct KillerMoves {
    slots: [[Option<Move>; 2]; MAX_DEPTH],
}

impl KillerMoves {
    pub fn new() -> Self {
        Self {
            slots: [[None; 2]; MAX_DEPTH],
        }
    }

    pub fn clear(&mut self) {
        self.slots = [[None; 2]; MAX_DEPTH];
    }

    #[inline(always)]
    pub fn get(&self, ply: usize) -> [Option<Move>; 2] {
        self.slots.get(ply).copied().unwrap_or([None; 2])
    }

    #[inline(always)]
    pub fn store(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }
}

impl Default for KillerMoves {
    fn default() -> Self {
        Self::new()
    }
}
