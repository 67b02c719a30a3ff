pub mod board_metrics;
pub mod eval;
pub mod material;
pub mod moves;
mod position;
pub mod rules;

pub use eval::flip_eval_perspective;
pub use material::{
    cap_eval_by_material, game_phase, has_insufficient_material, side_has_insufficient_material,
};
pub use moves::{
    collect_legal_moves, gives_check, has_check, has_legal_moves, is_capture, is_en_passant,
    make_move, move_key, takes_piece,
};
pub use position::Position;
pub use rules::{GameOutcome, Terminal};
