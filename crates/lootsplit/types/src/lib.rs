//! Lootsplit Types - the shared data model.
//!
//! Items move through a closed two-state lifecycle (`Assigned` then
//! `Distributed`). Everything a caller needs to render an item, its split,
//! or the profit ledger lives here so storage and ledger crates agree on shape.
#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Opaque numeric item identifier, assigned by storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque user identifier. The core never interprets its contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Item lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Created and waiting for its seller to sell it.
    Assigned,
    /// Sold and split. Terminal.
    Distributed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Distributed => "distributed",
        }
    }

    pub fn is_terminal(self) -> bool {
        match self {
            Self::Assigned => false,
            Self::Distributed => true,
        }
    }

    /// Whether `self -> next` is a legal lifecycle edge.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        match (self, next) {
            (Self::Assigned, Self::Distributed) => true,
            (Self::Assigned, Self::Assigned) | (Self::Distributed, _) => false,
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item status `{0}`")]
pub struct ParseStatusError(pub String);

impl FromStr for ItemStatus {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "assigned" => Ok(Self::Assigned),
            "distributed" => Ok(Self::Distributed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A user entitled to a share of an item's proceeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: i64,
    pub item_id: ItemId,
    pub user_id: UserId,
    /// `None` until the item is distributed, fixed afterwards.
    pub share_amount: Option<i64>,
}

/// A tracked loot item with its participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub estimated_value: i64,
    pub status: ItemStatus,
    pub assigned_to: UserId,
    pub sale_amount: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion ordered.
    pub participants: Vec<Participant>,
}

impl Item {
    pub fn participant_ids(&self) -> Vec<UserId> {
        self.participants
            .iter()
            .map(|participant| participant.user_id.clone())
            .collect()
    }

    pub fn has_participant(&self, user_id: &UserId) -> bool {
        self.participants
            .iter()
            .any(|participant| &participant.user_id == user_id)
    }

    pub fn share_of(&self, user_id: &UserId) -> Option<i64> {
        self.participants
            .iter()
            .find(|participant| &participant.user_id == user_id)
            .and_then(|participant| participant.share_amount)
    }
}

/// Insert payload for a new item. Storage assigns id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub estimated_value: i64,
    /// Insertion ordered, expected to be free of duplicates.
    pub participants: Vec<UserId>,
    /// Must be one of `participants`.
    pub seller: UserId,
}

/// One entry of a share mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantShare {
    pub user_id: UserId,
    pub amount: i64,
}

impl ParticipantShare {
    pub fn new(user_id: UserId, amount: i64) -> Self {
        Self { user_id, amount }
    }
}

/// Append-only ledger fact written when an item is distributed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitRecord {
    pub id: i64,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub item_name: String,
    pub amount: i64,
    pub transaction_date: DateTime<Utc>,
}
