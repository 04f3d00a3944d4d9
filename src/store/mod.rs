//! Persistence for wizard flags, in memory or backed by libSQL.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlFlagStore;
pub use memory::MemoryFlagStore;
pub use traits::FlagStore;
