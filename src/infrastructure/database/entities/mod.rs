//! Database entities module

pub mod map_tier;
pub mod player_time;
pub mod user;

pub use map_tier::Entity as MapTier;
pub use player_time::Entity as PlayerTime;
pub use user::Entity as User;
