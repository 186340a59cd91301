//! Database initialization, records and data-access operations
//!
//! Write operations take a `&mut SqliteConnection` so the caller owns the
//! transaction scope (`pool.begin()` ... `commit()`).

pub mod calibrations;
pub mod components;
pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
