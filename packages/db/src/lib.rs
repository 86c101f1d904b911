//! SurrealDB integration for the canvas scheduler.
//!
//! This crate provides database connectivity and the key/value
//! repository that backs scheduler checkpoints.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage

mod connection;
mod schema;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect};
pub use repositories::ConfigStore;
pub use schema::init_schema;
