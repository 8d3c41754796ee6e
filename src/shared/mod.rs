pub mod paginator;
pub mod shutdown;
pub mod sql;
pub mod types;

pub use paginator::*;
pub use shutdown::*;
pub use sql::*;
pub use types::*;
