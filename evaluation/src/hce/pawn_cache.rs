use cozy_chess::{BitBoard, Board, Color, Piece};

#[derive(Debug, Clone, Copy)]
pub struct CachedPawnEvaluation {
    pub white: i16,
    pub black: i16,
}

// Single-entry memo of the last pawn structure score, keyed on both pawn sets
// and the phase. Pawn structures change rarely between neighboring nodes.
pub struct PawnCache {
    white_pawns: BitBoard,
    black_pawns: BitBoard,
    phase: f32,
    evaluation: Option<CachedPawnEvaluation>,
}

impl PawnCache {
    pub fn new() -> Self {
        Self {
            white_pawns: BitBoard::EMPTY,
            black_pawns: BitBoard::EMPTY,
            phase: 0.0,
            evaluation: None,
        }
    }

    pub fn get(&self, board: &Board, phase: f32) -> Option<CachedPawnEvaluation> {
        let white_pawns = board.colored_pieces(Color::White, Piece::Pawn);
        let black_pawns = board.colored_pieces(Color::Black, Piece::Pawn);

        if white_pawns == self.white_pawns
            && black_pawns == self.black_pawns
            && phase == self.phase
        {
            self.evaluation
        } else {
            None
        }
    }

    pub fn set(&mut self, board: &Board, phase: f32, entry: CachedPawnEvaluation) {
        self.white_pawns = board.colored_pieces(Color::White, Piece::Pawn);
        self.black_pawns = board.colored_pieces(Color::Black, Piece::Pawn);
        self.phase = phase;
        self.evaluation = Some(entry);
    }

    /// Forget the memo; pawn weights changed.
    pub fn clear(&mut self) {
        self.evaluation = None;
    }
}
