//! Versioned configuration store.
//!
//! Configs are append-only versioned documents keyed by `(kind, name,
//! version)`; at most one version per `(kind, name)` is active at a time.
//! Activation is a single transaction that deactivates the previous active
//! version and activates the new one; deleting the active version promotes
//! the latest remaining one. The aggregation core only ever reads an
//! already-resolved active snapshot via [`ConfigStore::active_content`].

use std::fmt;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Configuration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Global,
    Report,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Global => "global",
            ConfigKind::Report => "report",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(ConfigKind::Global),
            "report" => Some(ConfigKind::Report),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known global configuration names.
pub mod global_names {
    pub const PER_CONF: &str = "per_conf";
}

/// One stored configuration version.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    pub id: i64,
    pub kind: ConfigKind,
    pub name: String,
    pub version: i64,
    pub is_active: bool,
    pub description: String,
    pub created: String,
    pub content: Value,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid config content: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored config row {id} has unknown kind '{kind}'")]
    UnknownKind { id: i64, kind: String },

    #[error("no active '{name}' {kind} config object exists")]
    NoActiveConfig { kind: ConfigKind, name: String },

    #[error("'{key}' was not found in the per_conf global config object")]
    MissingPerConfKey { key: String },
}

pub struct ConfigStore {
    conn: Connection,
}

impl ConfigStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS configs (
                id          INTEGER PRIMARY KEY,
                kind        TEXT NOT NULL,
                name        TEXT NOT NULL,
                version     INTEGER NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 0,
                description TEXT NOT NULL DEFAULT '',
                created     TEXT NOT NULL,
                content     TEXT NOT NULL,
                UNIQUE (kind, name, version)
            );",
        )?;
        Ok(())
    }

    /// Append a new version for `(kind, name)`. The first version is 0; the
    /// record starts inactive, activation is explicit.
    pub fn create(
        &self,
        kind: ConfigKind,
        name: &str,
        description: &str,
        content: &Value,
    ) -> Result<ConfigRecord, StoreError> {
        let version = self
            .latest(kind, name)?
            .map(|latest| latest.version + 1)
            .unwrap_or(0);
        let created = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO configs (kind, name, version, is_active, description, created, content)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6)",
            params![
                kind.as_str(),
                name,
                version,
                description,
                created,
                serde_json::to_string(content)?
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(kind = %kind, name, version, "created config version");
        Ok(ConfigRecord {
            id,
            kind,
            name: name.to_string(),
            version,
            is_active: false,
            description: description.to_string(),
            created,
            content: content.clone(),
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<ConfigRecord>, StoreError> {
        self.query_one("SELECT * FROM configs WHERE id = ?1", params![id])
    }

    /// The highest version for `(kind, name)`, active or not.
    pub fn latest(&self, kind: ConfigKind, name: &str) -> Result<Option<ConfigRecord>, StoreError> {
        self.query_one(
            "SELECT * FROM configs WHERE kind = ?1 AND name = ?2
             ORDER BY version DESC LIMIT 1",
            params![kind.as_str(), name],
        )
    }

    /// The active version for `(kind, name)`, if any.
    pub fn active(&self, kind: ConfigKind, name: &str) -> Result<Option<ConfigRecord>, StoreError> {
        self.query_one(
            "SELECT * FROM configs WHERE kind = ?1 AND name = ?2 AND is_active = 1",
            params![kind.as_str(), name],
        )
    }

    /// All versions for `(kind, name)`, active first, then newest first.
    pub fn versions(&self, kind: ConfigKind, name: &str) -> Result<Vec<ConfigRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM configs WHERE kind = ?1 AND name = ?2
             ORDER BY is_active DESC, created DESC",
        )?;
        let rows = stmt.query_map(params![kind.as_str(), name], row_to_record)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row??);
        }
        Ok(out)
    }

    /// Make `id` the single active version of its `(kind, name)`.
    pub fn activate(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let (kind, name): (String, String) = tx.query_row(
            "SELECT kind, name FROM configs WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        tx.execute(
            "UPDATE configs SET is_active = 0 WHERE kind = ?1 AND name = ?2 AND is_active = 1",
            params![kind, name],
        )?;
        tx.execute("UPDATE configs SET is_active = 1 WHERE id = ?1", params![id])?;
        tx.commit()?;
        debug!(kind = %kind, name = %name, id, "activated config version");
        Ok(())
    }

    /// Replace the stored content of one version (reformatting writes through
    /// here).
    pub fn update_content(&self, id: i64, content: &Value) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE configs SET content = ?1 WHERE id = ?2",
            params![serde_json::to_string(content)?, id],
        )?;
        Ok(())
    }

    /// Delete one version. Deleting the active version promotes the latest
    /// remaining version of the same `(kind, name)`.
    pub fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        let Some(record) = self.get(id)? else {
            return Ok(());
        };
        self.conn
            .execute("DELETE FROM configs WHERE id = ?1", params![id])?;
        if record.is_active {
            if let Some(latest) = self.latest(record.kind, &record.name)? {
                self.activate(latest.id)?;
            }
        }
        Ok(())
    }

    /// The schema-unvalidated content of the active `(kind, name)` config, if
    /// one exists. This is the single read the aggregation core consumes.
    pub fn active_content(
        &self,
        kind: ConfigKind,
        name: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.active(kind, name)?.map(|record| record.content))
    }

    /// Look up `key` in the active `per_conf` global config object.
    ///
    /// Missing store object is an error (the deployment has not been
    /// migrated); a missing key falls back to `default` unless `required`.
    pub fn per_conf_value(
        &self,
        key: &str,
        default: Option<Value>,
        required: bool,
    ) -> Result<Value, StoreError> {
        let per_conf = self
            .active(ConfigKind::Global, global_names::PER_CONF)?
            .ok_or_else(|| StoreError::NoActiveConfig {
                kind: ConfigKind::Global,
                name: global_names::PER_CONF.to_string(),
            })?;
        if let Some(value) = per_conf.content.get(key) {
            return Ok(value.clone());
        }
        if required {
            return Err(StoreError::MissingPerConfKey {
                key: key.to_string(),
            });
        }
        Ok(default.unwrap_or(Value::Null))
    }

    fn query_one(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<ConfigRecord>, StoreError> {
        let row = self
            .conn
            .query_row(sql, params, row_to_record)
            .optional()?;
        row.transpose()
    }
}

type RecordResult = Result<ConfigRecord, StoreError>;

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordResult> {
    let id: i64 = row.get("id")?;
    let kind_str: String = row.get("kind")?;
    let content_str: String = row.get("content")?;

    Ok((|| {
        let kind = ConfigKind::parse(&kind_str).ok_or(StoreError::UnknownKind {
            id,
            kind: kind_str.clone(),
        })?;
        let content: Value = serde_json::from_str(&content_str)?;
        Ok(ConfigRecord {
            id,
            kind,
            name: row.get("name")?,
            version: row.get("version")?,
            is_active: row.get::<_, i64>("is_active")? != 0,
            description: row.get("description")?,
            created: row.get("created")?,
            content,
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn versions_are_append_only_and_start_inactive() {
        let store = ConfigStore::open_in_memory().unwrap();
        let v0 = store
            .create(ConfigKind::Report, "perf", "", &json!({"a": 1}))
            .unwrap();
        let v1 = store
            .create(ConfigKind::Report, "perf", "tweak", &json!({"a": 2}))
            .unwrap();

        assert_eq!(v0.version, 0);
        assert_eq!(v1.version, 1);
        assert!(store.active(ConfigKind::Report, "perf").unwrap().is_none());
        assert_eq!(
            store.latest(ConfigKind::Report, "perf").unwrap().unwrap().id,
            v1.id
        );
    }

    #[test]
    fn activation_deactivates_the_previous_version() {
        let mut store = ConfigStore::open_in_memory().unwrap();
        let v0 = store
            .create(ConfigKind::Report, "perf", "", &json!({"a": 1}))
            .unwrap();
        let v1 = store
            .create(ConfigKind::Report, "perf", "", &json!({"a": 2}))
            .unwrap();

        store.activate(v0.id).unwrap();
        store.activate(v1.id).unwrap();

        let active = store.active(ConfigKind::Report, "perf").unwrap().unwrap();
        assert_eq!(active.id, v1.id);

        let versions = store.versions(ConfigKind::Report, "perf").unwrap();
        assert_eq!(versions.iter().filter(|v| v.is_active).count(), 1);
    }

    #[test]
    fn deleting_the_active_version_promotes_the_latest_remaining() {
        let mut store = ConfigStore::open_in_memory().unwrap();
        let v0 = store
            .create(ConfigKind::Report, "perf", "", &json!({"a": 1}))
            .unwrap();
        let v1 = store
            .create(ConfigKind::Report, "perf", "", &json!({"a": 2}))
            .unwrap();
        store.activate(v1.id).unwrap();

        store.delete(v1.id).unwrap();

        let active = store.active(ConfigKind::Report, "perf").unwrap().unwrap();
        assert_eq!(active.id, v0.id);
    }

    #[test]
    fn active_content_is_none_without_an_active_version() {
        let store = ConfigStore::open_in_memory().unwrap();
        store
            .create(ConfigKind::Report, "perf", "", &json!({"a": 1}))
            .unwrap();
        assert!(store
            .active_content(ConfigKind::Report, "perf")
            .unwrap()
            .is_none());
    }

    #[test]
    fn per_conf_lookup_requires_the_store_object() {
        let mut store = ConfigStore::open_in_memory().unwrap();
        let err = store.per_conf_value("logs_base", None, false).unwrap_err();
        assert!(matches!(err, StoreError::NoActiveConfig { .. }), "got: {err}");

        let per_conf = store
            .create(
                ConfigKind::Global,
                global_names::PER_CONF,
                "",
                &json!({"logs_base": "https://logs.example.org"}),
            )
            .unwrap();
        store.activate(per_conf.id).unwrap();

        assert_eq!(
            store.per_conf_value("logs_base", None, false).unwrap(),
            json!("https://logs.example.org")
        );
        assert_eq!(
            store
                .per_conf_value("missing", Some(json!(42)), false)
                .unwrap(),
            json!(42)
        );
        let err = store.per_conf_value("missing", None, true).unwrap_err();
        assert!(matches!(err, StoreError::MissingPerConfKey { .. }), "got: {err}");
    }

    #[test]
    fn store_survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.db");

        {
            let mut store = ConfigStore::open(&path).unwrap();
            let v0 = store
                .create(ConfigKind::Report, "perf", "", &json!({"a": 1}))
                .unwrap();
            store.activate(v0.id).unwrap();
        }

        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(
            store.active_content(ConfigKind::Report, "perf").unwrap(),
            Some(json!({"a": 1}))
        );
    }
}
