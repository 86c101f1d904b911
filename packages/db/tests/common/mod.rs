use db::{ConfigStore, DbConfig, DbError};

/// Fresh in-memory store; every `mem://` connection is isolated.
pub async fn setup_store() -> Result<ConfigStore, DbError> {
    ConfigStore::open(&DbConfig::memory()).await
}
