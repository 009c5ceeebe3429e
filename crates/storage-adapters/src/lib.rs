//! # storage-adapters
//!
//! Implementations of the `domains` repository ports. The in-memory store
//! is always available; the PostgreSQL store sits behind `db-postgres`.

pub mod memory;
pub mod seed;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
pub use seed::default_badge_definitions;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
