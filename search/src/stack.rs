use ahash::AHashSet;

/// Zobrist hashes along the path being searched, root first.
pub struct SearchStack {
    hashes: Vec<u64>,
}

impl SearchStack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hashes: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.hashes.clear();
    }

    #[inline(always)]
    pub fn push(&mut self, hash: u64) {
        self.hashes.push(hash);
    }

    #[inline(always)]
    pub fn pop(&mut self) {
        self.hashes.pop();
    }

    /// The newest position already occurred, earlier in the game or on the path.
    /// A single repetition is scored as a draw.
    #[inline(always)]
    pub fn is_repetition(&self, game_history: &AHashSet<u64>) -> bool {
        let Some((current, path)) = self.hashes.split_last() else {
            return false;
        };
        game_history.contains(current) || path.contains(current)
    }
}
