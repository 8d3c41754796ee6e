pub mod client;
pub mod player_lookup;

pub use client::InstrumentedHttpClient;
pub use player_lookup::SteamPlayerLookup;
