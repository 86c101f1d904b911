//! Repository implementations for database operations.

mod config_repo;

pub use config_repo::{ConfigStore, glob_to_regex};
