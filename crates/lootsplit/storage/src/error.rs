use lootsplit_types::{ItemId, ItemStatus, UserId};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("item {item_id} is {status}, expected assigned")]
    InvalidState {
        item_id: ItemId,
        status: ItemStatus,
        sale_amount: Option<i64>,
    },

    /// The item's seller changed after the caller read it.
    #[error("user {user_id} is no longer the seller of item {item_id}")]
    NotSeller { item_id: ItemId, user_id: UserId },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub(crate) fn item_not_found(item_id: ItemId) -> Self {
        Self::NotFound(format!("item {item_id} not found"))
    }
}
