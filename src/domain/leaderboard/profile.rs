//! Player profile read model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rounded percentage of `part` in `whole`; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Completion of the maps in one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierCompletion {
    #[schema(example = 2)]
    pub tier: i32,
    #[schema(example = 5)]
    pub completed_maps: u64,
    #[schema(example = 10)]
    pub total_maps: u64,
    #[schema(example = 50)]
    pub completed_maps_percentage: u32,
}

impl TierCompletion {
    pub fn new(tier: i32, completed_maps: u64, total_maps: u64) -> Self {
        Self {
            tier,
            completed_maps,
            total_maps,
            completed_maps_percentage: percentage(completed_maps, total_maps),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapCompletionSummary {
    /// Main courses finished out of all tiered maps
    #[schema(example = 75)]
    pub completed_maps_percentage: u32,
    /// Bonus courses finished out of every bonus anyone has finished
    #[schema(example = 40)]
    pub completed_bonus_percentage: u32,
    #[schema(example = "surf_utopia", nullable)]
    pub most_played_map: Option<String>,
    pub completed_maps_tier: Vec<TierCompletion>,
}

/// Player profile with server-wide standing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(example = 39732541)]
    pub auth: i32,
    #[schema(example = "Gamer123", nullable)]
    pub name: Option<String>,
    #[schema(nullable)]
    pub player_nickname: Option<String>,
    #[schema(nullable)]
    pub player_profile_url: Option<String>,
    #[schema(nullable)]
    pub player_avatar: Option<String>,
    /// Position by points, 1 = most points
    #[schema(example = 25)]
    pub server_rank: u64,
    #[schema(example = "US", nullable)]
    pub location_country: Option<String>,
    #[schema(nullable)]
    pub location_flag: Option<String>,
    pub total_points: f64,
    /// Seconds played
    pub total_playtime: f64,
    /// Unix epoch seconds
    #[schema(nullable)]
    pub first_seen: Option<i64>,
    #[schema(nullable)]
    pub last_seen: Option<i64>,
    /// Main courses where the player holds the best time
    pub world_records_map: u64,
    /// Bonus courses where the player holds the best time
    pub world_records_bonus: u64,
    pub total_played_maps: u64,
    pub total_played_maps_bonus: u64,
    pub map_completion: MapCompletionSummary,
}

/// A player's best run on one map, track and style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCompletion {
    #[schema(example = "surf_utopia")]
    pub map: String,
    #[schema(example = "Main")]
    pub track: String,
    #[schema(example = "Normal")]
    pub style: String,
    #[schema(nullable)]
    pub tier: Option<i32>,
    /// Best time in seconds
    pub best_time: f64,
    /// Finished runs on this course
    pub runs: u64,
    /// Unix epoch seconds of the newest finish
    pub last_completed: i64,
    /// Whether the best time is also the course record
    pub is_record: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_and_handles_empty() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(TierCompletion::new(1, 1, 2).completed_maps_percentage, 50);
    }
}
