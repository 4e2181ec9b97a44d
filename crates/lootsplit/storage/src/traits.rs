use crate::StorageResult;
use async_trait::async_trait;
use lootsplit_types::{Item, ItemId, NewItem, ParticipantShare, ProfitRecord, UserId};

/// Storage interface for items and their participants.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert an item (status `Assigned`) and all its participant rows atomically.
    async fn create_item(&self, item: NewItem) -> StorageResult<Item>;

    /// Set the seller of a not-yet-distributed item.
    async fn assign_seller(&self, item_id: ItemId, user_id: &UserId) -> StorageResult<()>;

    /// Get one item with its participants.
    async fn fetch_item(&self, item_id: ItemId) -> StorageResult<Item>;

    /// List items newest-first.
    async fn list_items(&self) -> StorageResult<Vec<Item>>;

    /// Move an item from `Assigned` to `Distributed`, fix every share, and
    /// append one ledger row per participant. All or nothing.
    ///
    /// Only succeeds while `seller` is still the item's seller.
    async fn record_distribution(
        &self,
        item_id: ItemId,
        seller: &UserId,
        sale_amount: i64,
        shares: &[ParticipantShare],
    ) -> StorageResult<Vec<ProfitRecord>>;
}

/// Read interface over the append-only profit ledger.
#[async_trait]
pub trait ProfitHistoryStore: Send + Sync {
    /// Every ledger row, oldest first.
    async fn list_profit_records(&self) -> StorageResult<Vec<ProfitRecord>>;

    /// Ledger rows for one user, newest first.
    async fn user_profit_records(&self, user_id: &UserId) -> StorageResult<Vec<ProfitRecord>>;

    /// Sum of a user's ledger rows; zero when there are none.
    async fn user_profit_total(&self, user_id: &UserId) -> StorageResult<i64>;
}

/// Unified storage bundle shared by the lifecycle manager and ledger views.
pub trait LootStorage: ItemStore + ProfitHistoryStore + Send + Sync {}

impl<T> LootStorage for T where T: ItemStore + ProfitHistoryStore + Send + Sync {}
