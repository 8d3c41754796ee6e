//! Leaderboard domain types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::DomainError;

/// Game mode; each mode is served from its own database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Surf,
    Bhop,
}

impl GameMode {
    pub const ALL: &'static [GameMode] = &[Self::Surf, Self::Bhop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Surf => "surf",
            Self::Bhop => "bhop",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "surf" => Ok(Self::Surf),
            "bhop" => Ok(Self::Bhop),
            _ => Err(DomainError::NotFound {
                entity: "GameMode",
                field: "mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Movement style a run was recorded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Normal,
    Sideways,
    HalfSideways,
    WOnly,
    Scroll,
    Stamina,
    Backwards,
    LowGravity,
    Slow,
    Fast,
}

impl Style {
    pub fn from_index(index: i32) -> Option<Self> {
        Some(match index {
            0 => Self::Normal,
            1 => Self::Sideways,
            2 => Self::HalfSideways,
            3 => Self::WOnly,
            4 => Self::Scroll,
            5 => Self::Stamina,
            6 => Self::Backwards,
            7 => Self::LowGravity,
            8 => Self::Slow,
            9 => Self::Fast,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Sideways => "Sideways",
            Self::HalfSideways => "HalfSideways",
            Self::WOnly => "WOnly",
            Self::Scroll => "Scroll",
            Self::Stamina => "Stamina",
            Self::Backwards => "Backwards",
            Self::LowGravity => "LowGravity",
            Self::Slow => "Slow",
            Self::Fast => "Fast",
        }
    }

    /// Name for a stored style index, `"Unknown"` for indices outside the table.
    pub fn label(index: i32) -> &'static str {
        Self::from_index(index).map(|s| s.name()).unwrap_or("Unknown")
    }
}

/// Track label: 0 is the main course, n ≥ 1 is bonus n.
pub fn track_label(index: i32) -> String {
    match index {
        0 => "Main".to_string(),
        n if n > 0 => format!("Bonus {}", n),
        _ => "Unknown".to_string(),
    }
}

/// Optional filters for the recent-times listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentTimesFilter {
    pub map: Option<String>,
    pub style: Option<i32>,
    pub track: Option<i32>,
}

/// Steam profile fields shown next to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub nickname: String,
    pub profile_url: String,
    pub avatar: String,
    pub location_country: Option<String>,
}

/// One run in a recent-times or recent-records page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentTime {
    /// Unix epoch timestamp when the run occurred
    #[schema(example = 1622470423)]
    pub date: i64,
    #[schema(example = "surf_utopia")]
    pub map: String,
    #[schema(example = "linear", nullable)]
    pub map_type: Option<String>,
    /// Steam account id of the player
    #[schema(example = "39732541")]
    pub player: String,
    #[schema(example = "Gamer123", nullable)]
    pub player_nickname: Option<String>,
    #[schema(example = "https://steamcommunity.com/id/Gamer123", nullable)]
    pub player_profile_url: Option<String>,
    #[schema(nullable)]
    pub player_avatar: Option<String>,
    /// ISO country code derived from the player's last IP
    #[schema(example = "BR", nullable)]
    pub player_location_country: Option<String>,
    #[schema(example = "https://flagsapi.com/BR/flat/64.png", nullable)]
    pub player_location_country_flag: Option<String>,
    #[schema(example = 50.0)]
    pub points: f64,
    /// Position across the whole listing
    #[schema(example = 1)]
    pub rank: u64,
    /// Run time in seconds
    #[schema(example = 12.34)]
    pub run_time: f64,
    /// Difference to the best other time on the same map and track
    #[schema(example = 0.2, nullable)]
    pub run_time_difference: Option<f64>,
    #[schema(example = "Sideways")]
    pub style: String,
    #[schema(example = 3, nullable)]
    pub tier: Option<i32>,
    #[schema(example = "Main")]
    pub track: String,
}

/// Map tier row as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapTierInfo {
    #[schema(example = "surf_utopia")]
    pub map: String,
    #[schema(example = 1)]
    pub tier: i32,
    #[schema(example = 3500.0, nullable)]
    pub maxvelocity: Option<f64>,
    #[schema(nullable)]
    pub autobhop_enabled: Option<bool>,
    #[schema(example = "linear", nullable)]
    pub map_type: Option<String>,
}

/// Public user fields; the stored IP never leaves the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    #[schema(example = 39732541)]
    pub auth: i32,
    #[schema(example = "Gamer123", nullable)]
    pub name: Option<String>,
    /// Unix epoch seconds
    #[schema(example = 1622470423, nullable)]
    pub firstlogin: Option<i64>,
    #[schema(example = 1625072423, nullable)]
    pub lastlogin: Option<i64>,
    #[schema(example = 1234.5)]
    pub points: f64,
    /// Seconds played
    #[schema(example = 3600.0)]
    pub playtime: f64,
}
