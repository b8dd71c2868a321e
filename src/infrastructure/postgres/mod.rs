//! PostgreSQL persistence module.
//!
//! Provides the connection pool backing the PostgreSQL template store.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
