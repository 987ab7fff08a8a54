use ins_core::{Error, Result, Storage};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown storage backend: {} (expected memory or sqlite)",
                other
            ))),
        }
    }
}

pub const DEFAULT_DATABASE_PATH: &str = "insights.db";

/// Open the backend named by `kind`. `database` is only used by SQLite.
pub async fn create_storage(kind: &str, database: Option<&Path>) -> Result<Arc<dyn Storage>> {
    match kind.parse::<StorageKind>()? {
        StorageKind::Memory => {
            info!("💾 Using in-memory storage, nothing will survive a restart");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = database.unwrap_or_else(|| Path::new(DEFAULT_DATABASE_PATH));
            info!("💾 Opening SQLite database at {}", path.display());
            Ok(Arc::new(SQLiteStorage::new_with_path(path).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            let _ = database;
            Err(Error::Config(
                "SQLite support was not compiled in (enable the `sqlite` feature)".to_string(),
            ))
        }
    }
}
