use cozy_chess::Piece;

/// Piece values for middlegame (mg) and endgame (eg), interpolated by game phase.
///
/// <https://www.chessprogramming.org/Tapered_Eval>
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceValues {
    pub pawn_value_mg: f32,
    pub pawn_value_eg: f32,
    pub knight_value_mg: f32,
    pub knight_value_eg: f32,
    pub bishop_value_mg: f32,
    pub bishop_value_eg: f32,
    pub rook_value_mg: f32,
    pub rook_value_eg: f32,
    pub queen_value_mg: f32,
    pub queen_value_eg: f32,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn_value_mg: 100.0,
            pawn_value_eg: 120.0,
            knight_value_mg: 320.0,
            knight_value_eg: 300.0,
            bishop_value_mg: 330.0,
            bishop_value_eg: 320.0,
            rook_value_mg: 500.0,
            rook_value_eg: 540.0,
            queen_value_mg: 950.0,
            queen_value_eg: 980.0,
        }
    }
}

impl PieceValues {
    pub const LEN: usize = 10;

    /// Returns the interpolated piece value based on game phase (1.0 = opening, 0.0 = endgame).
    pub fn get(&self, piece: Piece, phase: f32) -> i16 {
        let (mg, eg) = match piece {
            Piece::Pawn => (self.pawn_value_mg, self.pawn_value_eg),
            Piece::Knight => (self.knight_value_mg, self.knight_value_eg),
            Piece::Bishop => (self.bishop_value_mg, self.bishop_value_eg),
            Piece::Rook => (self.rook_value_mg, self.rook_value_eg),
            Piece::Queen => (self.queen_value_mg, self.queen_value_eg),
            Piece::King => return 0, // Cut early for king
        };
        ((mg * phase) + (eg * (1.0 - phase))).round() as i16
    }

    /// Flat layout used by checkpoints: mg/eg pairs from pawn to queen.
    pub fn to_array(&self) -> [f32; Self::LEN] {
        [
            self.pawn_value_mg,
            self.pawn_value_eg,
            self.knight_value_mg,
            self.knight_value_eg,
            self.bishop_value_mg,
            self.bishop_value_eg,
            self.rook_value_mg,
            self.rook_value_eg,
            self.queen_value_mg,
            self.queen_value_eg,
        ]
    }

    pub fn from_array(v: [f32; Self::LEN]) -> Self {
        Self {
            pawn_value_mg: v[0],
            pawn_value_eg: v[1],
            knight_value_mg: v[2],
            knight_value_eg: v[3],
            bishop_value_mg: v[4],
            bishop_value_eg: v[5],
            rook_value_mg: v[6],
            rook_value_eg: v[7],
            queen_value_mg: v[8],
            queen_value_eg: v[9],
        }
    }
}
