//! Users and player profiles per game mode

pub mod handlers;

pub use handlers::*;
