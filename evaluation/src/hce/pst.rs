use cozy_chess::{BitBoard, Color, Piece, Square};

/// Piece-Square Tables: position-dependent bonuses/penalties for each piece.
/// Separate tables for middlegame (mg) and endgame (eg), interpolated by game phase.
///
/// Values are in centipawns and defined from White's side (a1=index 0, h8=index 63);
/// Black reads the same tables through a vertical mirror.
///
/// <https://www.chessprogramming.org/Piece-Square_Tables>
#[derive(Debug, Clone, PartialEq)]
pub struct PieceSquareTables {
    // [piece][mg, eg][square]
    tables: [[[f32; 64]; 2]; Piece::NUM],
}

impl Default for PieceSquareTables {
    fn default() -> Self {
        Self {
            tables: [
                [WHITE_PAWN_MG_PST, WHITE_PAWN_EG_PST],
                [WHITE_KNIGHT_MG_PST, WHITE_KNIGHT_EG_PST],
                [WHITE_BISHOP_MG_PST, WHITE_BISHOP_EG_PST],
                [WHITE_ROOK_MG_PST, WHITE_ROOK_EG_PST],
                [WHITE_QUEEN_MG_PST, WHITE_QUEEN_EG_PST],
                [WHITE_KING_MG_PST, WHITE_KING_EG_PST],
            ],
        }
    }
}

impl PieceSquareTables {
    pub const LEN: usize = Piece::NUM * 2 * 64;

    pub fn zeroed() -> Self {
        Self {
            tables: [[[0.0; 64]; 2]; Piece::NUM],
        }
    }

    #[inline(always)]
    pub fn sum(
        &self,
        squares: BitBoard,
        piece: Piece,
        color: Color,
        phase: f32,
        inv_phase: f32,
    ) -> i16 {
        let [mg, eg] = &self.tables[piece as usize];
        let mut total = 0.0;
        for sq in squares {
            let idx = relative_index(sq, color);
            total += mg[idx] * phase + eg[idx] * inv_phase;
        }
        total.round() as i16
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.tables.iter().flatten().flatten().copied().collect()
    }

    pub fn from_slice(values: &[f32]) -> Option<Self> {
        if values.len() != Self::LEN {
            return None;
        }
        let mut out = Self::zeroed();
        for (dst, src) in out
            .tables
            .iter_mut()
            .flatten()
            .flatten()
            .zip(values.iter())
        {
            *dst = *src;
        }
        Some(out)
    }
}

#[inline(always)]
fn relative_index(sq: Square, color: Color) -> usize {
    match color {
        Color::White => sq as usize,
        Color::Black => sq.flip_rank() as usize,
    }
}

// Pawns, middlegame: central pawns first.
const WHITE_PAWN_MG_PST: [f32; 64] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 1 (a1-h1)
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 2
    10.0, 12.0, 15.0, 20.0, 20.0, 15.0, 12.0, 10.0, // rank 3
    15.0, 18.0, 25.0, 30.0, 30.0, 25.0, 18.0, 15.0, // rank 4
    20.0, 25.0, 35.0, 40.0, 40.0, 35.0, 25.0, 20.0, // rank 5
    10.0, 12.0, 15.0, 20.0, 20.0, 15.0, 12.0, 10.0, // rank 6
    -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, // rank 7
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 8
];

// Pawns, endgame: advance.
const WHITE_PAWN_EG_PST: [f32; 64] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 1
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 2
    10.0, 12.0, 15.0, 20.0, 20.0, 15.0, 12.0, 10.0, // rank 3
    20.0, 25.0, 30.0, 35.0, 35.0, 30.0, 25.0, 20.0, // rank 4
    35.0, 40.0, 45.0, 50.0, 50.0, 45.0, 40.0, 35.0, // rank 5
    50.0, 55.0, 60.0, 70.0, 70.0, 60.0, 55.0, 50.0, // rank 6
    80.0, 85.0, 90.0, 100.0, 100.0, 90.0, 85.0, 80.0, // rank 7
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 8
];

// Knights, middlegame.
const WHITE_KNIGHT_MG_PST: [f32; 64] = [
    -50.0, -40.0, -30.0, -30.0, -30.0, -30.0, -40.0, -50.0, // rank 1
    -40.0, -20.0, 0.0, 5.0, 5.0, 0.0, -20.0, -40.0, // rank 2
    -30.0, 5.0, 10.0, 15.0, 15.0, 10.0, 5.0, -30.0, // rank 3
    -30.0, 0.0, 15.0, 20.0, 20.0, 15.0, 0.0, -30.0, // rank 4
    -30.0, 5.0, 20.0, 25.0, 25.0, 20.0, 5.0, -30.0, // rank 5
    -30.0, 0.0, 15.0, 20.0, 20.0, 15.0, 0.0, -30.0, // rank 6
    -40.0, -20.0, 0.0, 0.0, 0.0, 0.0, -20.0, -40.0, // rank 7
    -50.0, -40.0, -30.0, -30.0, -30.0, -30.0, -40.0, -50.0, // rank 8
];

// Knights, endgame.
const WHITE_KNIGHT_EG_PST: [f32; 64] = [
    -50.0, -40.0, -30.0, -20.0, -20.0, -30.0, -40.0, -50.0, // rank 1
    -40.0, -20.0, 0.0, 0.0, 0.0, 0.0, -20.0, -40.0, // rank 2
    -30.0, 0.0, 10.0, 10.0, 10.0, 10.0, 0.0, -30.0, // rank 3
    -20.0, 10.0, 20.0, 20.0, 20.0, 20.0, 10.0, -20.0, // rank 4
    -20.0, 10.0, 20.0, 20.0, 20.0, 20.0, 10.0, -20.0, // rank 5
    -30.0, 0.0, 10.0, 10.0, 10.0, 10.0, 0.0, -30.0, // rank 6
    -40.0, -20.0, 0.0, 0.0, 0.0, 0.0, -20.0, -40.0, // rank 7
    -50.0, -40.0, -30.0, -20.0, -20.0, -30.0, -40.0, -50.0, // rank 8
];

// Bishops, middlegame: long diagonals.
const WHITE_BISHOP_MG_PST: [f32; 64] = [
    -20.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -20.0, // rank 1
    -10.0, 5.0, 0.0, 0.0, 0.0, 0.0, 5.0, -10.0, // rank 2
    -10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, -10.0, // rank 3
    -10.0, 0.0, 10.0, 15.0, 15.0, 10.0, 0.0, -10.0, // rank 4
    -10.0, 5.0, 15.0, 20.0, 20.0, 15.0, 5.0, -10.0, // rank 5
    -10.0, 0.0, 10.0, 15.0, 15.0, 10.0, 0.0, -10.0, // rank 6
    -10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -10.0, // rank 7
    -20.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -20.0, // rank 8
];

// Bishops, endgame.
const WHITE_BISHOP_EG_PST: [f32; 64] = [
    -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, // rank 1
    -10.0, -5.0, 0.0, 0.0, 0.0, 0.0, -5.0, -10.0, // rank 2
    -5.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -5.0, // rank 3
    0.0, 5.0, 10.0, 15.0, 15.0, 10.0, 5.0, 0.0, // rank 4
    0.0, 5.0, 10.0, 15.0, 15.0, 10.0, 5.0, 0.0, // rank 5
    -5.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -5.0, // rank 6
    -10.0, -5.0, 0.0, 0.0, 0.0, 0.0, -5.0, -10.0, // rank 7
    -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, -10.0, // rank 8
];

// Rooks, middlegame: seventh rank.
const WHITE_ROOK_MG_PST: [f32; 64] = [
    0.0, 0.0, 0.0, 5.0, 5.0, 0.0, 0.0, 0.0, // rank 1
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 2
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 3
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 4
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 5
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 6
    5.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 5.0, // rank 7
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 8
];

// Rooks, endgame.
const WHITE_ROOK_EG_PST: [f32; 64] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 1
    5.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 5.0, // rank 2
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 3
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 4
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 5
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // rank 6
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 7
    -10.0, -10.0, -10.0, -5.0, -5.0, -10.0, -10.0, -10.0, // rank 8
];

// Queens, middlegame: stay home early.
const WHITE_QUEEN_MG_PST: [f32; 64] = [
    -20.0, -10.0, -10.0, -5.0, -5.0, -10.0, -10.0, -20.0, // rank 1
    -10.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, -10.0, // rank 2
    -10.0, 5.0, 5.0, 5.0, 5.0, 5.0, 0.0, -10.0, // rank 3
    0.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -5.0, // rank 4
    -5.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -5.0, // rank 5
    -10.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -10.0, // rank 6
    -10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -10.0, // rank 7
    -20.0, -10.0, -10.0, -5.0, -5.0, -10.0, -10.0, -20.0, // rank 8
];

// Queens, endgame.
const WHITE_QUEEN_EG_PST: [f32; 64] = [
    -10.0, -10.0, -5.0, 0.0, 0.0, -5.0, -10.0, -10.0, // rank 1
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, // rank 2
    -5.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -5.0, // rank 3
    0.0, 5.0, 10.0, 10.0, 10.0, 10.0, 5.0, 0.0, // rank 4
    0.0, 5.0, 10.0, 10.0, 10.0, 10.0, 5.0, 0.0, // rank 5
    -5.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, -5.0, // rank 6
    -5.0, 0.0, 0.0, 5.0, 5.0, 0.0, 0.0, -5.0, // rank 7
    -10.0, -10.0, -10.0, -5.0, -5.0, -10.0, -10.0, -10.0, // rank 8
];

// Kings, middlegame: castled corners.
const WHITE_KING_MG_PST: [f32; 64] = [
    20.0, 30.0, 10.0, 0.0, 0.0, 10.0, 30.0, 20.0, // rank 1
    20.0, 20.0, 0.0, 0.0, 0.0, 0.0, 20.0, 20.0, // rank 2
    10.0, 0.0, -10.0, -20.0, -20.0, -10.0, 0.0, 10.0, // rank 3
    0.0, 0.0, -20.0, -30.0, -30.0, -20.0, 0.0, 0.0, // rank 4
    -10.0, -20.0, -30.0, -40.0, -40.0, -30.0, -20.0, -10.0, // rank 5
    -20.0, -30.0, -40.0, -50.0, -50.0, -40.0, -30.0, -20.0, // rank 6
    -30.0, -40.0, -50.0, -60.0, -60.0, -50.0, -40.0, -30.0, // rank 7
    -40.0, -50.0, -60.0, -70.0, -70.0, -60.0, -50.0, -40.0, // rank 8
];

// Kings, endgame: centralize.
const WHITE_KING_EG_PST: [f32; 64] = [
    -50.0, -30.0, -20.0, -10.0, -10.0, -20.0, -30.0, -50.0, // rank 1
    -30.0, -20.0, 0.0, 5.0, 5.0, 0.0, -20.0, -30.0, // rank 2
    -20.0, 0.0, 10.0, 20.0, 20.0, 10.0, 0.0, -20.0, // rank 3
    -10.0, 5.0, 20.0, 30.0, 30.0, 20.0, 5.0, -10.0, // rank 4
    -10.0, 5.0, 20.0, 30.0, 30.0, 20.0, 5.0, -10.0, // rank 5
    -20.0, 0.0, 10.0, 20.0, 20.0, 10.0, 0.0, -20.0, // rank 6
    -30.0, -20.0, 0.0, 5.0, 5.0, 0.0, -20.0, -30.0, // rank 7
    -50.0, -30.0, -20.0, -10.0, -10.0, -20.0, -30.0, -50.0, // rank 8
];
