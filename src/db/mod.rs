//! Database module for Pulseboard.
//!
//! Provides read-only SQLite access with automatic migrations.

mod models;
mod store;

pub use models::*;
pub use store::*;
