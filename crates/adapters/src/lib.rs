//! agro-registry adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite and in-memory registry stores

mod store_memory;
mod store_sqlite;

/// Re-exports for registry store adapters
pub mod store {
    pub use crate::store_memory::InMemoryRegistryStore;
    pub use crate::store_sqlite::SqliteRegistryStore;
}
