//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.query(CONFIG_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Generic key/value table backing checkpoints and renderer state.
const CONFIG_SCHEMA: &str = r#"
-- Small scalars updated on every few scheduler sends
DEFINE TABLE IF NOT EXISTS config SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS key ON config TYPE string;
DEFINE FIELD IF NOT EXISTS value ON config TYPE int;
DEFINE FIELD IF NOT EXISTS updated_at ON config TYPE datetime VALUE time::now();

DEFINE INDEX IF NOT EXISTS config_key ON config FIELDS key UNIQUE;
"#;
