use cozy_chess::{Board, Move, Piece};

/// Check if a move is a real capture (enemy piece on destination).
/// Correctly handles castling, which cozy-chess represents as "king captures rook".
#[inline(always)]
pub fn is_capture(board: &Board, mv: Move) -> bool {
    board.colors(!board.side_to_move()).has(mv.to)
}

/// En passant lands on an empty square, so `is_capture` misses it.
#[inline(always)]
pub fn is_en_passant(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::Pawn)
        && mv.from.file() != mv.to.file()
        && board.piece_on(mv.to).is_none()
}

/// Any move that removes an enemy piece, en passant included.
#[inline(always)]
pub fn takes_piece(board: &Board, mv: Move) -> bool {
    is_capture(board, mv) || is_en_passant(board, mv)
}

/// Make a move and return a new board. The source board is left untouched.
#[inline(always)]
pub fn make_move(board: &Board, mv: Move) -> Board {
    let mut new_board = board.clone();
    new_board.play_unchecked(mv);
    new_board
}

/// Check if there are any legal moves in the position.
#[inline(always)]
pub fn has_legal_moves(board: &Board) -> bool {
    board.generate_moves(|_| true)
}

/// Collect all legal moves into a Vec.
#[inline(always)]
pub fn collect_legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|batch| {
        moves.extend(batch);
        false
    });
    moves
}

/// Check if the side to move is in check.
#[inline(always)]
pub fn has_check(board: &Board) -> bool {
    !board.checkers().is_empty()
}

/// Check if a move gives check to the opponent.
#[inline(always)]
pub fn gives_check(board: &Board, mv: Move) -> bool {
    let new_board = make_move(board, mv);
    has_check(&new_board)
}

/// Stable key for breaking ties between equally scored moves.
#[inline(always)]
pub fn move_key(mv: Move) -> u16 {
    let promo = mv.promotion.map_or(0, |p| p as u16 + 1);
    ((mv.from as u16) << 9) | ((mv.to as u16) << 3) | promo
}
