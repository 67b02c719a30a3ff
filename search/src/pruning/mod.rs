mod aspiration;
mod mate_distance;

pub use aspiration::{AspirationWindow, Pass};
pub use mate_distance::mate_distance_prune;
