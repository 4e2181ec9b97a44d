use crate::memory::InMemoryLootStorage;
use crate::traits::LootStorage;
use crate::StorageResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    Memory,

    /// SQLite storage
    Sqlite {
        /// Connection URL, e.g. `sqlite://data/lootsplit.db?mode=rwc`
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

impl StorageConfig {
    pub fn sqlite(url: impl Into<String>) -> Self {
        Self::Sqlite {
            url: url.into(),
            max_connections: default_pool_size(),
            connect_timeout_secs: default_connection_timeout(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite { .. } => "sqlite",
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}

fn default_pool_size() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    5
}

/// Build the configured backend. The returned handle is meant to be created
/// once and passed to every component that needs storage.
pub async fn open_storage(config: &StorageConfig) -> StorageResult<Arc<dyn LootStorage>> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(InMemoryLootStorage::new())),
        #[cfg(feature = "sqlite")]
        StorageConfig::Sqlite {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let storage = crate::sqlite::SqliteLootStorage::connect_with_options(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageConfig::Sqlite { .. } => Err(crate::StorageError::Backend(
            "sqlite support not compiled in (enable the `sqlite` feature)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(StorageConfig::default(), StorageConfig::Memory);
        assert_eq!(StorageConfig::default().label(), "memory");
    }

    #[test]
    fn test_sqlite_defaults() {
        match StorageConfig::sqlite("sqlite::memory:") {
            StorageConfig::Sqlite {
                max_connections,
                connect_timeout_secs,
                ..
            } => {
                assert_eq!(max_connections, 5);
                assert_eq!(connect_timeout_secs, 5);
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_memory_storage() {
        let storage = open_storage(&StorageConfig::Memory).await.unwrap();
        assert!(storage.list_items().await.unwrap().is_empty());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn open_sqlite_storage() {
        let storage = open_storage(&StorageConfig::sqlite("sqlite::memory:"))
            .await
            .unwrap();
        assert!(storage.list_profit_records().await.unwrap().is_empty());
    }
}
