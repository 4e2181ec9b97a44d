//! In-memory reference implementation of the lootsplit storage traits.
//!
//! All state sits behind a single lock so every multi-row mutation is one
//! critical section. Each mutation validates fully before writing anything,
//! which gives the same all-or-nothing behaviour as a database transaction.

use crate::guard::{check_new_item, check_share_mapping};
use crate::traits::{ItemStore, ProfitHistoryStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use lootsplit_types::{
    Item, ItemId, ItemStatus, NewItem, Participant, ParticipantShare, ProfitRecord, UserId,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    history: Vec<ProfitRecord>,
    next_item_id: i64,
    next_participant_id: i64,
    next_record_id: i64,
}

/// In-memory lootsplit storage adapter.
#[derive(Default)]
pub struct InMemoryLootStorage {
    state: RwLock<MemoryState>,
}

impl InMemoryLootStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("loot state lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| StorageError::Backend("loot state lock poisoned".to_string()))
    }
}

#[async_trait]
impl ItemStore for InMemoryLootStorage {
    async fn create_item(&self, item: NewItem) -> StorageResult<Item> {
        check_new_item(&item)?;
        let mut seen = HashSet::with_capacity(item.participants.len());
        for user_id in &item.participants {
            if !seen.insert(user_id) {
                return Err(StorageError::Conflict(format!(
                    "participant {user_id} listed twice"
                )));
            }
        }

        let mut guard = self.write()?;
        guard.next_item_id += 1;
        let item_id = ItemId::new(guard.next_item_id);
        let now = Utc::now();

        let mut participants = Vec::with_capacity(item.participants.len());
        for user_id in item.participants {
            guard.next_participant_id += 1;
            participants.push(Participant {
                participant_id: guard.next_participant_id,
                item_id,
                user_id,
                share_amount: None,
            });
        }

        let record = Item {
            id: item_id,
            name: item.name,
            estimated_value: item.estimated_value,
            status: ItemStatus::Assigned,
            assigned_to: item.seller,
            sale_amount: None,
            created_at: now,
            updated_at: now,
            participants,
        };
        guard.items.insert(item_id, record.clone());
        tracing::debug!(item_id = %item_id, "stored item in memory");
        Ok(record)
    }

    async fn assign_seller(&self, item_id: ItemId, user_id: &UserId) -> StorageResult<()> {
        let mut guard = self.write()?;
        let item = guard
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StorageError::item_not_found(item_id))?;

        if item.status != ItemStatus::Assigned {
            return Err(StorageError::InvalidState {
                item_id,
                status: item.status,
                sale_amount: item.sale_amount,
            });
        }
        if !item.has_participant(user_id) {
            return Err(StorageError::InvalidInput(format!(
                "user {user_id} is not a participant of item {item_id}"
            )));
        }

        item.assigned_to = user_id.clone();
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn fetch_item(&self, item_id: ItemId) -> StorageResult<Item> {
        let guard = self.read()?;
        guard
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| StorageError::item_not_found(item_id))
    }

    async fn list_items(&self) -> StorageResult<Vec<Item>> {
        let guard = self.read()?;
        let mut values = guard.items.values().cloned().collect::<Vec<_>>();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(values)
    }

    async fn record_distribution(
        &self,
        item_id: ItemId,
        seller: &UserId,
        sale_amount: i64,
        shares: &[ParticipantShare],
    ) -> StorageResult<Vec<ProfitRecord>> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StorageError::item_not_found(item_id))?;

        if item.status != ItemStatus::Assigned {
            return Err(StorageError::InvalidState {
                item_id,
                status: item.status,
                sale_amount: item.sale_amount,
            });
        }
        if &item.assigned_to != seller {
            return Err(StorageError::NotSeller {
                item_id,
                user_id: seller.clone(),
            });
        }
        check_share_mapping(&item.participant_ids(), sale_amount, shares)?;

        let now = Utc::now();
        item.status = ItemStatus::Distributed;
        item.sale_amount = Some(sale_amount);
        item.updated_at = now;

        let mut records = Vec::with_capacity(shares.len());
        for participant in &mut item.participants {
            let amount = shares
                .iter()
                .find(|share| share.user_id == participant.user_id)
                .map(|share| share.amount)
                .unwrap_or_default();
            participant.share_amount = Some(amount);

            state.next_record_id += 1;
            records.push(ProfitRecord {
                id: state.next_record_id,
                user_id: participant.user_id.clone(),
                item_id,
                item_name: item.name.clone(),
                amount,
                transaction_date: now,
            });
        }

        state.history.extend(records.iter().cloned());
        tracing::debug!(item_id = %item_id, sale_amount, rows = records.len(), "recorded distribution in memory");
        Ok(records)
    }
}

#[async_trait]
impl ProfitHistoryStore for InMemoryLootStorage {
    async fn list_profit_records(&self) -> StorageResult<Vec<ProfitRecord>> {
        let guard = self.read()?;
        Ok(guard.history.clone())
    }

    async fn user_profit_records(&self, user_id: &UserId) -> StorageResult<Vec<ProfitRecord>> {
        let guard = self.read()?;
        let mut records = guard
            .history
            .iter()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(records)
    }

    async fn user_profit_total(&self, user_id: &UserId) -> StorageResult<i64> {
        let guard = self.read()?;
        guard
            .history
            .iter()
            .filter(|record| &record.user_id == user_id)
            .try_fold(0i64, |total, record| total.checked_add(record.amount))
            .ok_or_else(|| {
                StorageError::Backend(format!("profit total for {user_id} overflows i64"))
            })
    }
}
