use std::mem::size_of;

use cozy_chess::{Move, Piece, Square};
use evaluation::scores::MATE_SCORE_BOUND;

/// How a stored score relates to the true value.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Bound {
    /// True minimax value (alpha < value < beta)
    #[default]
    Exact = 0,
    /// Value >= beta (beta cutoff)
    Lower = 1,
    /// Value <= alpha (all moves failed)
    Upper = 2,
}

impl Bound {
    #[inline(always)]
    pub fn classify(value: i16, alpha: i16, beta: i16) -> Self {
        if value <= alpha {
            Bound::Upper
        } else if value >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        }
    }
}

/// A stored result. Only usable for cutoffs when `depth` is enough.
#[derive(Clone, Copy, Debug)]
pub struct ProbeResult {
    /// Mate scores already re-based to the probing ply
    pub value: i16,
    pub bound: Bound,
    /// Unverified: may be illegal after a key collision
    pub best_move: Option<Move>,
    pub static_eval: Option<i16>,
    pub depth: u8,
}

/// Move squeezed into 16 bits: from in [5:0], to in [11:6], promotion in [15:12].
/// Zero means no move; a real move never packs to zero since from != to.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
struct PackedMove(u16);

const PROMOTIONS: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

impl PackedMove {
    const NONE: PackedMove = PackedMove(0);

    fn new(mv: Option<Move>) -> Self {
        let Some(mv) = mv else {
            return Self::NONE;
        };
        let promo = mv
            .promotion
            .and_then(|p| PROMOTIONS.iter().position(|&q| q == p))
            .map_or(0, |i| i as u16 + 1);
        PackedMove(mv.from as u16 | (mv.to as u16) << 6 | promo << 12)
    }

    fn unpack(self) -> Option<Move> {
        if self == Self::NONE {
            return None;
        }
        let promo = (self.0 >> 12) as usize;
        Some(Move {
            from: Square::index((self.0 & 0x3F) as usize),
            to: Square::index(((self.0 >> 6) & 0x3F) as usize),
            promotion: promo.checked_sub(1).and_then(|i| PROMOTIONS.get(i).copied()),
        })
    }
}

/// Mate scores are kept relative to the node that stored them.
#[inline(always)]
fn to_stored(value: i16, ply: u8) -> i16 {
    match value {
        v if v >= MATE_SCORE_BOUND => v + ply as i16,
        v if v <= -MATE_SCORE_BOUND => v - ply as i16,
        v => v,
    }
}

#[inline(always)]
fn from_stored(value: i16, ply: u8) -> i16 {
    match value {
        v if v >= MATE_SCORE_BOUND => v - ply as i16,
        v if v <= -MATE_SCORE_BOUND => v + ply as i16,
        v => v,
    }
}

const NO_EVAL: i16 = i16::MIN;

/// 12 bytes.
#[derive(Clone, Copy, Default)]
struct TTEntry {
    /// Upper 32 bits of the Zobrist hash; the lower bits pick the cluster
    key: u32,
    value: i16,
    static_eval: i16,
    best_move: PackedMove,
    depth: u8,
    bound: Bound,
    generation: u8,
}

impl TTEntry {
    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.key == 0 && self.best_move == PackedMove::NONE && self.depth == 0
    }

    #[inline(always)]
    fn holds(&self, key: u32) -> bool {
        self.key == key && !self.is_empty()
    }

    /// Depth, with a half-step bonus for bounds that can cut.
    #[inline(always)]
    fn quality(&self) -> i16 {
        let bonus = match self.bound {
            Bound::Exact | Bound::Lower => 1,
            Bound::Upper => 0,
        };
        self.depth as i16 + bonus
    }

    /// Replacement priority inside a full cluster; lowest goes first.
    #[inline(always)]
    fn keep_score(&self, generation: u8) -> i16 {
        8 * self.quality() - generation.wrapping_sub(self.generation) as i16
    }
}

const CLUSTER_SIZE: usize = 4;
const MIN_BUCKETS: usize = 1024;

/// Search memo in 4-entry clusters.
///
/// A 32-bit key match on the right cluster is trusted. A full collision is
/// accepted as bounded error, so callers check a stored move for legality
/// before playing it.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    buckets: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Table of about `mb` megabytes.
    pub fn new(mb: usize) -> Self {
        let capacity = mb.saturating_mul(1 << 20) / size_of::<TTEntry>();
        let buckets = (capacity / CLUSTER_SIZE).max(MIN_BUCKETS);

        Self {
            entries: vec![TTEntry::default(); buckets * CLUSTER_SIZE],
            buckets,
            generation: 0,
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(TTEntry::default());
        self.generation = 0;
    }

    /// Called once per search so older entries lose priority.
    pub fn age(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Permille of used entries among the first thousand.
    pub fn hashfull(&self) -> u16 {
        let sample = &self.entries[..self.entries.len().min(1000)];
        let used = sample.iter().filter(|e| !e.is_empty()).count();
        (used * 1000 / sample.len()) as u16
    }

    #[inline(always)]
    fn cluster(&self, hash: u64) -> std::ops::Range<usize> {
        let base = (hash as usize % self.buckets) * CLUSTER_SIZE;
        base..base + CLUSTER_SIZE
    }

    #[inline(always)]
    fn key_of(hash: u64) -> u32 {
        (hash >> 32) as u32
    }

    /// Deepest entry for `hash`, its mate scores re-based to `ply`.
    pub fn probe(&self, hash: u64, ply: u8) -> Option<ProbeResult> {
        let key = Self::key_of(hash);
        let entry = self.entries[self.cluster(hash)]
            .iter()
            .filter(|e| e.holds(key))
            .max_by_key(|e| e.depth)?;

        Some(ProbeResult {
            value: from_stored(entry.value, ply),
            bound: entry.bound,
            best_move: entry.best_move.unpack(),
            static_eval: (entry.static_eval != NO_EVAL).then_some(entry.static_eval),
            depth: entry.depth,
        })
    }

    /// Records a result searched with window `(alpha, beta)`.
    ///
    /// An existing entry for the same position is only replaced by a result at
    /// least as good; otherwise an empty slot is used, then the entry with the
    /// lowest keep score.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        hash: u64,
        ply: u8,
        remaining_depth: u8,
        value: i16,
        static_eval: Option<i16>,
        alpha: i16,
        beta: i16,
        best_move: Option<Move>,
    ) {
        let key = Self::key_of(hash);
        let generation = self.generation;
        let mut fresh = TTEntry {
            key,
            value: to_stored(value, ply),
            static_eval: static_eval.unwrap_or(NO_EVAL),
            best_move: PackedMove::new(best_move),
            depth: remaining_depth,
            bound: Bound::classify(value, alpha, beta),
            generation,
        };

        let range = self.cluster(hash);
        let cluster = &mut self.entries[range];

        if let Some(old) = cluster.iter_mut().find(|e| e.holds(key)) {
            let exact_upgrade = fresh.bound == Bound::Exact
                && old.bound != Bound::Exact
                && fresh.depth >= old.depth;
            if exact_upgrade || fresh.quality() >= old.quality() {
                if fresh.static_eval == NO_EVAL {
                    fresh.static_eval = old.static_eval;
                }
                if fresh.best_move == PackedMove::NONE {
                    fresh.best_move = old.best_move;
                }
                *old = fresh;
            }
            return;
        }

        let slot = match cluster.iter().position(TTEntry::is_empty) {
            Some(i) => i,
            None => cluster
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.keep_score(generation))
                .map_or(0, |(i, _)| i),
        };
        cluster[slot] = fresh;
    }
}
