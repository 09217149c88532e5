//! # Storage Adapters
//!
//! Implementations of the persistence ports from `domains`.
//!
//! * [`memory`] is always compiled. Tests and dev mode run on it.
//! * [`postgres`] is behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

// Re-exporting for easier access in other crates
pub use memory::InMemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
