pub mod maps;
pub mod players;
pub mod service;

pub use maps::MapTiersService;
pub use players::PlayersService;
pub use service::{ModeSources, RecentTimesService};
