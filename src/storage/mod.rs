pub mod dual;
pub mod location;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;
