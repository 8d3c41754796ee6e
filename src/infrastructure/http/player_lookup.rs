//! Steam Web API and country.is backed [`PlayerLookup`]

use std::net::Ipv4Addr;

use async_trait::async_trait;
use serde::Deserialize;

use super::client::InstrumentedHttpClient;
use crate::domain::{PlayerLookup, PlayerSummary};
use crate::shared::AppResult;

/// Offset between a SteamID3 account id and its SteamID64.
pub const STEAM_ID64_BASE: u64 = 76_561_197_960_265_728;

pub const DEFAULT_STEAM_API_BASE: &str = "https://api.steampowered.com";
pub const DEFAULT_COUNTRY_API_BASE: &str = "https://api.country.is";

pub fn steam_id64(account_id: i64) -> Option<u64> {
    STEAM_ID64_BASE.checked_add_signed(account_id)
}

/// IPv4 address stored as a (possibly signed) 32-bit integer.
pub fn long_to_ip(ip_long: i64) -> Ipv4Addr {
    Ipv4Addr::from(ip_long as u32)
}

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesResponse,
}

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    #[serde(default)]
    players: Vec<SteamPlayer>,
}

#[derive(Debug, Deserialize)]
struct SteamPlayer {
    personaname: String,
    profileurl: String,
    avatarfull: String,
    loccountrycode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountryResponse {
    country: Option<String>,
}

pub struct SteamPlayerLookup {
    http: InstrumentedHttpClient,
    api_key: Option<String>,
    steam_api_base: String,
    country_api_base: String,
}

impl SteamPlayerLookup {
    pub fn new(http: InstrumentedHttpClient, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            steam_api_base: DEFAULT_STEAM_API_BASE.to_string(),
            country_api_base: DEFAULT_COUNTRY_API_BASE.to_string(),
        }
    }

    pub fn with_steam_api_base(mut self, base: impl Into<String>) -> Self {
        self.steam_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_country_api_base(mut self, base: impl Into<String>) -> Self {
        self.country_api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl PlayerLookup for SteamPlayerLookup {
    async fn player_summary(&self, account_id: i64) -> AppResult<Option<PlayerSummary>> {
        let (Some(key), Some(steam_id)) = (self.api_key.as_deref(), steam_id64(account_id)) else {
            return Ok(None);
        };
        let url = format!(
            "{}/ISteamUser/GetPlayerSummaries/v0002/",
            self.steam_api_base
        );
        let steam_id = steam_id.to_string();
        let envelope: SummariesEnvelope = self
            .http
            .get_json(&url, &[("key", key), ("steamids", steam_id.as_str())])
            .await?;

        Ok(envelope
            .response
            .players
            .into_iter()
            .next()
            .map(|p| PlayerSummary {
                nickname: p.personaname,
                profile_url: p.profileurl,
                avatar: p.avatarfull,
                location_country: p.loccountrycode,
            }))
    }

    async fn country_code(&self, ip_long: i64) -> AppResult<Option<String>> {
        let url = format!("{}/{}", self.country_api_base, long_to_ip(ip_long));
        let body: CountryResponse = self.http.get_json(&url, &[]).await?;
        Ok(body.country.filter(|c| !c.is_empty()))
    }
}
