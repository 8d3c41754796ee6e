//! Outbound port for player profile enrichment

use async_trait::async_trait;

use super::model::PlayerSummary;
use crate::shared::AppResult;

/// Resolves player profile data and IP geolocation.
///
/// Failures are reported, never hidden; callers decide whether a failed
/// lookup degrades the field or fails the request.
#[async_trait]
pub trait PlayerLookup: Send + Sync {
    /// Profile for a Steam account id. `Ok(None)` when the profile is unknown
    /// or lookups are disabled.
    async fn player_summary(&self, account_id: i64) -> AppResult<Option<PlayerSummary>>;

    /// ISO country code for an IPv4 address stored as an integer.
    async fn country_code(&self, ip_long: i64) -> AppResult<Option<String>>;

    fn flag_url(&self, country_code: &str) -> String {
        format!("https://flagsapi.com/{}/flat/64.png", country_code)
    }
}

/// Lookup that knows nobody.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlayerLookup;

#[async_trait]
impl PlayerLookup for NoPlayerLookup {
    async fn player_summary(&self, _account_id: i64) -> AppResult<Option<PlayerSummary>> {
        Ok(None)
    }

    async fn country_code(&self, _ip_long: i64) -> AppResult<Option<String>> {
        Ok(None)
    }
}
