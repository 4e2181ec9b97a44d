use lootsplit_allocation::AllocationError;
use lootsplit_storage::StorageError;
use lootsplit_types::{ItemId, ItemStatus, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type LootResult<T> = Result<T, LootError>;

/// Stable taxonomy code handed to the command layer alongside the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    InvalidState,
    ValidationFailure,
    Unauthorized,
    PersistenceFailure,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::ValidationFailure => "validation_failure",
            Self::Unauthorized => "unauthorized",
            Self::PersistenceFailure => "persistence_failure",
        }
    }
}

/// Errors surfaced by the lifecycle manager and ledger views.
#[derive(Debug, Error)]
pub enum LootError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The item is not in a state that allows the operation. Carries what
    /// the caller needs to explain why, e.g. the price it already sold for.
    #[error("item {item_id} is already {status}")]
    InvalidState {
        item_id: ItemId,
        status: ItemStatus,
        sale_amount: Option<i64>,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("user {requester} is not the seller of item {item_id}")]
    Unauthorized { item_id: ItemId, requester: UserId },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl LootError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidState { .. } => ErrorCode::InvalidState,
            Self::Validation(_) => ErrorCode::ValidationFailure,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Persistence(_) => ErrorCode::PersistenceFailure,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<StorageError> for LootError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound(msg) => Self::NotFound(msg),
            StorageError::InvalidState {
                item_id,
                status,
                sale_amount,
            } => Self::InvalidState {
                item_id,
                status,
                sale_amount,
            },
            StorageError::NotSeller { item_id, user_id } => Self::Unauthorized {
                item_id,
                requester: user_id,
            },
            StorageError::Conflict(msg)
            | StorageError::InvalidInput(msg)
            | StorageError::Serialization(msg)
            | StorageError::Backend(msg) => Self::Persistence(msg),
        }
    }
}

impl From<AllocationError> for LootError {
    fn from(value: AllocationError) -> Self {
        Self::Validation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_taxonomy() {
        let not_found: LootError = StorageError::NotFound("item 9 not found".to_string()).into();
        assert_eq!(not_found.code(), ErrorCode::NotFound);

        let state: LootError = StorageError::InvalidState {
            item_id: ItemId::new(3),
            status: ItemStatus::Distributed,
            sale_amount: Some(40),
        }
        .into();
        assert!(matches!(
            state,
            LootError::InvalidState {
                sale_amount: Some(40),
                ..
            }
        ));

        for err in [
            StorageError::Conflict("dup".to_string()),
            StorageError::Backend("disk".to_string()),
            StorageError::Serialization("bad".to_string()),
        ] {
            assert_eq!(LootError::from(err).code(), ErrorCode::PersistenceFailure);
        }
    }

    #[test]
    fn replaced_seller_is_unauthorized() {
        let err: LootError = StorageError::NotSeller {
            item_id: ItemId::new(5),
            user_id: UserId::new("old"),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert!(matches!(err, LootError::Unauthorized { requester, .. } if requester == UserId::new("old")));
    }

    #[test]
    fn allocation_errors_are_validation_failures() {
        let err: LootError = AllocationError::NegativeAmount(-5).into();
        assert_eq!(err.code(), ErrorCode::ValidationFailure);
        assert_eq!(err.code().as_str(), "validation_failure");
    }
}
