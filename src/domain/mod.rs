pub mod leaderboard;

pub use leaderboard::{
    percentage, GameMode, MapCompletionSummary, MapTierInfo, NoPlayerLookup, PlayerCompletion, PlayerInfo,
    PlayerLookup, PlayerSummary, RecentTime, RecentTimesFilter, Style, TierCompletion,
    UserProfile,
};
