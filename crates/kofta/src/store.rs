use crate::prelude::*;
use chrono::{DateTime, Utc};
use kofta_core::deploy::DeploymentRecord;
use kofta_core::session::User;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contracts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    template    TEXT NOT NULL,
    address     TEXT NOT NULL,
    deployed_by TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS session_user (
    slot         INTEGER PRIMARY KEY CHECK (slot = 0),
    email        TEXT NOT NULL,
    display_name TEXT
);
";

/// Append-only storage for deployment records.
pub trait DeploymentStore {
    /// Insert a record and return its generated id.
    fn add(&self, record: &DeploymentRecord) -> Result<i64, Error>;

    fn list(&self) -> Result<Vec<(i64, DeploymentRecord)>, Error>;
}

/// Sign-in state for the client.
pub trait AuthProvider {
    fn sign_in(&self, email: &str, display_name: Option<&str>) -> Result<User, Error>;

    fn sign_out(&self) -> Result<(), Error>;

    fn current_user(&self) -> Result<Option<User>, Error>;
}

/// SQLite-backed document store and local identity.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// `$KOFTA_DB` is handled by the CLI; this is the fallback location.
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs_next::data_dir()
            .ok_or_else(|| eyre!("Unable to determine data directory"))?
            .join("kofta")
            .join("kofta.db"))
    }

    pub fn open(path: &Path) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Persistence(f!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        Self::init(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl DeploymentStore for SqliteStore {
    fn add(&self, record: &DeploymentRecord) -> Result<i64, Error> {
        self.conn.execute(
            "INSERT INTO contracts (template, address, deployed_by, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.template,
                record.address,
                record.deployed_by,
                record.created_at
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list(&self) -> Result<Vec<(i64, DeploymentRecord)>, Error> {
        let mut statement = self.conn.prepare(
            "SELECT id, template, address, deployed_by, created_at FROM contracts ORDER BY id",
        )?;

        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                DeploymentRecord {
                    template: row.get(1)?,
                    address: row.get(2)?,
                    deployed_by: row.get(3)?,
                    created_at: row.get::<_, DateTime<Utc>>(4)?,
                },
            ))
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)
    }
}

impl AuthProvider for SqliteStore {
    fn sign_in(&self, email: &str, display_name: Option<&str>) -> Result<User, Error> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Validation("email is required".to_string()));
        }

        let user = User {
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO session_user (slot, email, display_name) VALUES (0, ?1, ?2)",
            params![user.email, user.display_name],
        )?;

        Ok(user)
    }

    fn sign_out(&self) -> Result<(), Error> {
        self.conn.execute("DELETE FROM session_user", [])?;
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>, Error> {
        self.conn
            .query_row(
                "SELECT email, display_name FROM session_user WHERE slot = 0",
                [],
                |row| {
                    Ok(User {
                        email: row.get(0)?,
                        display_name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(template: &str, address: &str) -> DeploymentRecord {
        DeploymentRecord {
            template: template.to_string(),
            address: address.to_string(),
            deployed_by: "0xabc".to_string(),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.add(&record("ERC20 Token", "0x1")).unwrap();
        let second = store.add(&record("ERC20 Token", "0x1")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_list_round_trips_records_in_insertion_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add(&record("ERC20 Token", "0x1")).unwrap();
        store.add(&record("NFT Minting", "0x2")).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1, record("ERC20 Token", "0x1"));
        assert_eq!(records[1].1.template, "NFT Minting");
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kofta.db");

        SqliteStore::open(&path)
            .unwrap()
            .add(&record("DAO Governance", "0x3"))
            .unwrap();

        let records = SqliteStore::open(&path).unwrap().list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.address, "0x3");
    }

    #[test]
    fn test_sign_in_and_out() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.current_user().unwrap(), None);

        store.sign_in("ada@example.com", Some("Ada")).unwrap();
        let user = store.sign_in("grace@example.com", None).unwrap();
        assert_eq!(store.current_user().unwrap(), Some(user));

        store.sign_out().unwrap();
        assert_eq!(store.current_user().unwrap(), None);
    }

    #[test]
    fn test_sign_in_requires_email() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.sign_in("  ", None),
            Err(Error::Validation(_))
        ));
    }
}
