//! Map tier listings per game mode

pub mod handlers;

pub use handlers::*;
