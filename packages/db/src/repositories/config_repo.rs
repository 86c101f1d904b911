//! Key/value repository for checkpoints and other small durable scalars.

use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{Database, DbError};

/// Repository over the `config` table.
///
/// Keys are free-form strings; callers namespace them (`Start_<job>`,
/// `End_<job>`, `TextLine`) so a whole family can be removed with
/// [`ConfigStore::delete_matching`].
#[derive(Clone)]
pub struct ConfigStore {
    db: Database,
}

/// Internal record type for SurrealDB.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    key: String,
    value: i64,
}

impl ConfigStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect, initialize the schema and wrap the handle.
    pub async fn open(config: &crate::DbConfig) -> Result<Self, DbError> {
        let db = crate::connect(config).await?;
        crate::init_schema(&db).await?;
        Ok(Self::new(db))
    }

    /// Read a value. Absence means "use the default", not an error.
    pub async fn get(&self, key: &str) -> Result<Option<i64>, DbError> {
        let record: Option<ConfigRecord> = self.db.select(("config", key.to_string())).await?;
        Ok(record.map(|r| r.value))
    }

    /// Insert or overwrite a value.
    pub async fn set(&self, key: &str, value: i64) -> Result<(), DbError> {
        let mut result = self
            .db
            .query("UPSERT type::thing('config', $key) SET key = $key, value = $value")
            .bind(("key", key.to_string()))
            .bind(("value", value))
            .await?;

        let records: Vec<ConfigRecord> = result.take(0)?;
        if records.is_empty() {
            return Err(DbError::Query(format!("Failed to write config key {key}")));
        }
        Ok(())
    }

    /// Remove a single key. Missing keys are ignored.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: Option<ConfigRecord> = self.db.delete(("config", key.to_string())).await?;
        Ok(())
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, DbError> {
        #[derive(Deserialize)]
        struct KeyOnly {
            key: String,
        }

        let mut result = self.db.query("SELECT key FROM config").await?;
        let rows: Vec<KeyOnly> = result.take(0)?;
        let mut keys: Vec<String> = rows.into_iter().map(|r| r.key).collect();
        keys.sort();
        Ok(keys)
    }

    /// Delete every key matching a `*` glob; returns how many were removed.
    ///
    /// Matching and deletion happen in one statement.
    pub async fn delete_matching(&self, pattern: &str) -> Result<usize, DbError> {
        let mut result = self
            .db
            .query("DELETE config WHERE string::matches(key, $pattern) RETURN BEFORE")
            .bind(("pattern", glob_to_regex(pattern)))
            .await?;

        let removed: Vec<ConfigRecord> = result.take(0)?;
        tracing::debug!("Deleted {} config keys matching {}", removed.len(), pattern);
        Ok(removed.len())
    }
}

/// Translate a pattern where `*` stands for any run of characters into an
/// anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '\\' | '.' | '+' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
    }
    regex.push('$');
    regex
}

#[cfg(test)]
mod tests {
    use super::glob_to_regex;

    #[test]
    fn glob_becomes_anchored_regex() {
        assert_eq!(glob_to_regex("*_job1"), "^.*_job1$");
        assert_eq!(glob_to_regex("Start_*"), "^Start_.*$");
        assert_eq!(glob_to_regex("a*b*c"), "^a.*b.*c$");
        assert_eq!(glob_to_regex("exact"), "^exact$");
        assert_eq!(glob_to_regex("v1.2(x)"), r"^v1\.2\(x\)$");
    }
}
