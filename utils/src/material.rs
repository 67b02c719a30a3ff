use cozy_chess::{BitBoard, Board, Color, Piece};

const DARK_SQUARES: BitBoard = BitBoard(0xAA55_AA55_AA55_AA55);

/// Pieces that can force mate with the king's help, each on its own.
const MATING_MATERIAL: [Piece; 3] = [Piece::Pawn, Piece::Rook, Piece::Queen];

const PHASE_WEIGHTS: [(Piece, u32); 4] = [
    (Piece::Knight, 1),
    (Piece::Bishop, 1),
    (Piece::Rook, 2),
    (Piece::Queen, 4),
];
const MAX_PHASE: u32 = 24;

/// (knights, bishops) of `color`, or `None` while it keeps mating material.
fn lone_minors(board: &Board, color: Color) -> Option<(u32, u32)> {
    let ours = board.colors(color);
    if MATING_MATERIAL
        .iter()
        .any(|&piece| !(board.pieces(piece) & ours).is_empty())
    {
        return None;
    }
    Some((
        (board.pieces(Piece::Knight) & ours).len(),
        (board.pieces(Piece::Bishop) & ours).len(),
    ))
}

/// True when `color` cannot mate whatever the opponent does: a bare king or a single minor.
pub fn side_has_insufficient_material(board: &Board, color: Color) -> bool {
    lone_minors(board, color).is_some_and(|(knights, bishops)| knights + bishops <= 1)
}

/// Keeps a side that cannot mate from being scored as winning. `score` is White-positive.
pub fn cap_eval_by_material(board: &Board, score: i16) -> i16 {
    match (
        side_has_insufficient_material(board, Color::White),
        side_has_insufficient_material(board, Color::Black),
    ) {
        (true, true) => 0,
        (true, false) => score.min(0),
        (false, true) => score.max(0),
        (false, false) => score,
    }
}

/// Dead draws: bare kings, a single minor against a bare king, and
/// one bishop each on squares of the same color.
pub fn has_insufficient_material(board: &Board) -> bool {
    let (Some(white), Some(black)) = (
        lone_minors(board, Color::White),
        lone_minors(board, Color::Black),
    ) else {
        return false;
    };

    match (white, black) {
        ((wn, wb), (bn, bb)) if wn + wb + bn + bb <= 1 => true,
        ((0, 1), (0, 1)) => {
            // Both dark or both light
            (board.pieces(Piece::Bishop) & DARK_SQUARES).len() != 1
        }
        _ => false,
    }
}

/// 1.0 with all pieces on the board, falling to 0.0 as minors and majors come off.
pub fn game_phase(board: &Board) -> f32 {
    let phase: u32 = PHASE_WEIGHTS
        .iter()
        .map(|&(piece, weight)| board.pieces(piece).len() * weight)
        .sum();
    phase.min(MAX_PHASE) as f32 / MAX_PHASE as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn dead_draws() {
        for fen in [
            "8/8/4k3/8/8/3K4/8/8 w - - 0 1",
            "8/8/4k3/8/8/3K4/6N1/8 b - - 0 1",
            "8/5n2/4k3/8/8/3K4/8/8 w - - 0 1",
            "8/8/4k3/8/8/3K4/8/2B5 w - - 0 1",
            // c1 and h6 are both dark
            "8/8/4k2b/8/8/3K4/8/2B5 w - - 0 1",
        ] {
            assert!(has_insufficient_material(&board(fen)), "{}", fen);
        }
    }

    #[test]
    fn positions_with_mating_chances() {
        for fen in [
            "8/8/4k3/8/8/3K4/6NN/8 w - - 0 1",
            "8/8/4k3/8/8/3K4/4P3/8 w - - 0 1",
            "8/8/4k3/8/8/3K4/8/7r w - - 0 1",
            // c1 dark, c8 light
            "2b5/8/4k3/8/8/3K4/8/2B5 w - - 0 1",
            "8/8/4k3/8/8/3K4/8/2B2n2 w - - 0 1",
        ] {
            assert!(!has_insufficient_material(&board(fen)), "{}", fen);
        }
    }

    #[test]
    fn side_without_mating_material_is_capped() {
        // White knight against Black pawn
        let b = board("8/5p2/4k3/8/8/3K4/6N1/8 w - - 0 1");
        assert!(side_has_insufficient_material(&b, Color::White));
        assert!(!side_has_insufficient_material(&b, Color::Black));
        assert_eq!(cap_eval_by_material(&b, 180), 0);
        assert_eq!(cap_eval_by_material(&b, -180), -180);

        let bare = board("8/8/4k3/8/8/3K4/8/8 w - - 0 1");
        assert_eq!(cap_eval_by_material(&bare, -40), 0);
    }

    #[test]
    fn phase_falls_with_material() {
        assert_eq!(game_phase(&Board::default()), 1.0);
        // Two rooks left
        let rooks = board("r3k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert!((game_phase(&rooks) - 4.0 / 24.0).abs() < 1e-6);
        assert_eq!(game_phase(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")), 0.0);
    }
}
