//! Shared application state.
//!
//! One instance behind an `Arc`, handed to the router. Database access is a
//! fresh connection per request opened from the configured path; migrations
//! already ran at boot, so per-request opens only re-check the version row.

use rusqlite::Connection;

use crate::config::Settings;
use crate::db::{self, DatabaseError};
use crate::mailer::Mailer;
use crate::storage::{FileStore, StorageError};

pub struct AppState {
    pub settings: Settings,
    pub storage: FileStore,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, StorageError> {
        let storage = FileStore::new(settings.upload_dir.clone())?;
        let mailer = Mailer::from_webhook(settings.mail_webhook_url.clone());
        Ok(Self {
            settings,
            storage,
            mailer,
        })
    }

    /// Open a database connection for the current request.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.settings.database_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    #[test]
    fn state_opens_database_and_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            bind_addr: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            database_path: tmp.path().join("clinic.db"),
            upload_dir: tmp.path().join("uploads"),
            jwt_secret: "secret".into(),
            token_ttl_hours: 1,
            cors_origin: "http://localhost:4200".into(),
            mail_webhook_url: None,
        };

        let state = AppState::new(settings).unwrap();
        let conn = state.open_db().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
        assert!(state.storage.root().exists());
    }
}
