//! SQLite-backed store

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::errors::StorageError;
use crate::domain::entities::{Code, OutputMapping, Tier};
use crate::domain::traits::Store;

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// File-backed store. Each call opens its own connection.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open the database file and create missing tables
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self { path };
        store.init_tables()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS output_mappings (
                input TEXT PRIMARY KEY,
                normal_output TEXT NOT NULL,
                special_output1 TEXT NOT NULL,
                special_output2 TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                user_type TEXT NOT NULL DEFAULT 'normal'
            )",
            [],
        )?;

        Ok(())
    }
}

/// Map a primary key clash to `AlreadyExists`
fn insert_error(err: rusqlite::Error, key: &str) -> StorageError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::AlreadyExists(key.to_string())
        }
        other => StorageError::Sqlite(other),
    }
}

fn mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

#[async_trait]
impl Store for SqliteStore {
    async fn add_output_mapping(&self, mapping: &OutputMapping) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO output_mappings (input, normal_output, special_output1, special_output2)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                mapping.code.as_str(),
                mapping.normal_output,
                mapping.special_output1,
                mapping.special_output2
            ],
        )
        .map_err(|e| insert_error(e, mapping.code.as_str()))?;
        Ok(())
    }

    async fn update_output_mapping(&self, mapping: &OutputMapping) -> Result<bool, StorageError> {
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE output_mappings
             SET normal_output = ?1, special_output1 = ?2, special_output2 = ?3
             WHERE input = ?4",
            rusqlite::params![
                mapping.normal_output,
                mapping.special_output1,
                mapping.special_output2,
                mapping.code.as_str()
            ],
        )?;
        Ok(rows > 0)
    }

    async fn delete_output_mapping(&self, code: &Code) -> Result<bool, StorageError> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM output_mappings WHERE input = ?1", [code.as_str()])?;
        Ok(rows > 0)
    }

    async fn get_output_mapping(&self, code: &Code) -> Result<Option<OutputMapping>, StorageError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT normal_output, special_output1, special_output2, input
                 FROM output_mappings WHERE input = ?1",
                [code.as_str()],
                mapping_from_row,
            )
            .optional()?;

        Ok(row.map(|(normal, special1, special2, _)| {
            OutputMapping::new(code.clone(), normal, special1, special2)
        }))
    }

    async fn list_output_mappings(&self) -> Result<Vec<OutputMapping>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT normal_output, special_output1, special_output2, input
             FROM output_mappings ORDER BY input",
        )?;

        let rows = stmt.query_map([], mapping_from_row)?;

        let mut mappings = Vec::new();
        for row in rows {
            let (normal, special1, special2, input) = row?;
            // Rows written by other tools may hold keys that are not codes
            match Code::parse(&input) {
                Some(code) => mappings.push(OutputMapping::new(code, normal, special1, special2)),
                None => tracing::warn!("Skipping output mapping with malformed key {:?}", input),
            }
        }
        Ok(mappings)
    }

    async fn get_user_tier(&self, username: &str) -> Result<Option<Tier>, StorageError> {
        let conn = self.connect()?;
        let tier: Option<String> = conn
            .query_row(
                "SELECT user_type FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(tier.map(|t| Tier::from_stored(&t)))
    }

    async fn add_user(&self, username: &str, tier: Tier) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (username, user_type) VALUES (?1, ?2)",
            [username, tier.as_str()],
        )
        .map_err(|e| insert_error(e, username))?;
        Ok(())
    }

    async fn update_user(&self, username: &str, tier: Tier) -> Result<bool, StorageError> {
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE users SET user_type = ?1 WHERE username = ?2",
            [tier.as_str(), username],
        )?;
        Ok(rows > 0)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
        Ok(rows > 0)
    }

    async fn list_users(&self) -> Result<Vec<(String, Tier)>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT username, user_type FROM users ORDER BY username")?;

        let rows = stmt.query_map([], |row| {
            let username: String = row.get(0)?;
            let tier: String = row.get(1)?;
            Ok((username, Tier::from_stored(&tier)))
        })?;

        let mut users = Vec::new();
        for user in rows {
            users.push(user?);
        }
        Ok(users)
    }
}
