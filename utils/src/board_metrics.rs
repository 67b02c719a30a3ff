use cozy_chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves,
    BitBoard, Board, Color, Piece,
};

#[derive(Clone, Copy, Debug)]
pub struct BoardMetrics {
    // Squares a color's pieces can move to or capture on (pawns excluded)
    pub space: [i16; Color::NUM],

    // Every square attacked by a color, pawns included
    pub attacks: [BitBoard; Color::NUM],

    // Attacks a color lands on the squares around the enemy king
    pub king_zone_attacks: [i16; Color::NUM],
}

impl BoardMetrics {
    pub fn new(board: &Board) -> Self {
        let mut space = [0i16; Color::NUM];
        let mut attacks = [BitBoard::EMPTY; Color::NUM];
        let mut king_zone_attacks = [0i16; Color::NUM];

        for color in Color::ALL {
            let enemy_king = board.king(!color);
            let zone = get_king_moves(enemy_king) | enemy_king.bitboard();
            let (s, a, k) = compute(board, color, zone);
            space[color as usize] = s;
            attacks[color as usize] = a;
            king_zone_attacks[color as usize] = k;
        }

        Self {
            space,
            attacks,
            king_zone_attacks,
        }
    }
}

/// Single pass over one side's pieces collecting space, attacks and king pressure.
fn compute(board: &Board, color: Color, king_zone: BitBoard) -> (i16, BitBoard, i16) {
    let occupied = board.occupied();
    let mine = board.colors(color);

    let mut space = 0i16;
    let mut attacks = BitBoard::EMPTY;
    let mut pressure = 0i16;

    for sq in board.colored_pieces(color, Piece::Pawn) {
        attacks |= get_pawn_attacks(sq, color);
    }

    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for sq in board.colored_pieces(color, piece) {
            let squares = match piece {
                Piece::Knight => get_knight_moves(sq),
                Piece::Bishop => get_bishop_moves(sq, occupied),
                Piece::Rook => get_rook_moves(sq, occupied),
                _ => get_bishop_moves(sq, occupied) | get_rook_moves(sq, occupied),
            };
            space += (squares & !mine).len() as i16;
            pressure += (squares & king_zone).len() as i16;
            attacks |= squares;
        }
    }

    attacks |= get_king_moves(board.king(color));

    (space, attacks, pressure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_symmetric() {
        let metrics = BoardMetrics::new(&Board::default());
        assert_eq!(metrics.space[0], metrics.space[1]);
        assert_eq!(metrics.attacks[0].len(), metrics.attacks[1].len());
        assert_eq!(metrics.king_zone_attacks, [0, 0]);
    }

    #[test]
    fn queen_next_to_king_adds_pressure() {
        let board: Board = "4k3/4Q3/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        let metrics = BoardMetrics::new(&board);
        assert!(metrics.king_zone_attacks[Color::White as usize] > 0);
        assert_eq!(metrics.king_zone_attacks[Color::Black as usize], 0);
    }
}
