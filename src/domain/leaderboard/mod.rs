pub mod model;
pub mod ports;
pub mod profile;

pub use model::{
    track_label, GameMode, MapTierInfo, PlayerInfo, PlayerSummary, RecentTime, RecentTimesFilter,
    Style,
};
pub use ports::{NoPlayerLookup, PlayerLookup};
pub use profile::{
    percentage, MapCompletionSummary, PlayerCompletion, TierCompletion, UserProfile,
};
