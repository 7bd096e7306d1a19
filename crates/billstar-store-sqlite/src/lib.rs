//! SQLite backend for the billstar usage warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] implements
//! [`billstar_core::sink::WarehouseSink`] and can hydrate a
//! [`billstar_core::warehouse::Warehouse`] from what it already holds.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
