//! Database models for persistent storage.

mod player;
mod progress;

pub use player::*;
pub use progress::*;
