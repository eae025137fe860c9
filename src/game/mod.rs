pub mod models;
pub mod normalize;

pub use models::{GameClock, GameState, LastPlay, PossessionSide, Situation, TeamScore};
pub use normalize::{normalize_game, NormalizeError};
