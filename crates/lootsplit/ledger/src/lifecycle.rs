//! Item lifecycle: `Assigned` on creation, `Distributed` exactly once on sale.

use crate::error::{LootError, LootResult};
use crate::profits::ProfitLedger;
use crate::settings::{LootConfig, SalePolicy};
use lootsplit_allocation::{allocate_shares, ShareAllocation};
use lootsplit_storage::LootStorage;
use lootsplit_types::{Item, ItemId, ItemStatus, NewItem, ProfitRecord, UserId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Everything a caller needs to report a completed sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOutcome {
    /// The item as persisted, now `Distributed`.
    pub item: Item,
    pub allocation: ShareAllocation,
    /// Ledger rows written by the sale.
    pub records: Vec<ProfitRecord>,
}

/// Drives items through their lifecycle against an injected store.
pub struct LifecycleManager {
    storage: Arc<dyn LootStorage>,
    policy: SalePolicy,
    rng: Mutex<StdRng>,
}

impl LifecycleManager {
    /// Manager with the default sale policy and an entropy-seeded draw.
    pub fn new(storage: Arc<dyn LootStorage>) -> Self {
        Self {
            storage,
            policy: SalePolicy::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Manager configured from `config`; a configured seed makes every
    /// remainder draw reproducible.
    pub fn from_config(storage: Arc<dyn LootStorage>, config: &LootConfig) -> Self {
        let rng = match config.allocation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(storage)
            .with_policy(config.policy)
            .with_rng(rng)
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_policy(mut self, policy: SalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn storage(&self) -> Arc<dyn LootStorage> {
        Arc::clone(&self.storage)
    }

    /// Read views over the same store.
    pub fn ledger(&self) -> ProfitLedger {
        ProfitLedger::new(self.storage())
    }

    /// Create an item owned by `participants`, to be sold by `seller`.
    ///
    /// The seller is always the first participant. Listing the seller again
    /// is tolerated; listing anyone else twice is rejected.
    pub async fn create_item(
        &self,
        name: &str,
        estimated_value: i64,
        participants: &[UserId],
        seller: &UserId,
    ) -> LootResult<Item> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LootError::validation("item name must not be blank"));
        }
        if estimated_value < 0 {
            return Err(LootError::validation(format!(
                "estimated value {estimated_value} is negative"
            )));
        }
        if seller.as_str().trim().is_empty() {
            return Err(LootError::validation("seller must not be blank"));
        }

        let mut roster = vec![seller.clone()];
        let mut seen = HashSet::from([seller.clone()]);
        for user_id in participants {
            if user_id.as_str().trim().is_empty() {
                return Err(LootError::validation("participant ids must not be blank"));
            }
            if user_id == seller {
                continue;
            }
            if !seen.insert(user_id.clone()) {
                return Err(LootError::validation(format!(
                    "user {user_id} cannot be listed more than once"
                )));
            }
            roster.push(user_id.clone());
        }

        let item = self
            .storage
            .create_item(NewItem {
                name: name.to_string(),
                estimated_value,
                participants: roster,
                seller: seller.clone(),
            })
            .await?;

        tracing::info!(
            item_id = %item.id,
            name = %item.name,
            estimated_value,
            seller = %item.assigned_to,
            participants = item.participants.len(),
            "item created"
        );
        Ok(item)
    }

    /// Items newest first, optionally restricted to one status.
    pub async fn list_items(&self, status: Option<ItemStatus>) -> LootResult<Vec<Item>> {
        let items = self.storage.list_items().await?;
        Ok(match status {
            Some(status) => items.into_iter().filter(|item| item.status == status).collect(),
            None => items,
        })
    }

    pub async fn view_item(&self, item_id: ItemId) -> LootResult<Item> {
        Ok(self.storage.fetch_item(item_id).await?)
    }

    /// Sell an item and split the proceeds.
    ///
    /// Only the assigned seller may sell, and only once. If another sale of
    /// the same item commits first, this one fails with `InvalidState` and
    /// nothing it computed is persisted. If the seller is reassigned in the
    /// meantime it fails with `Unauthorized`.
    pub async fn sell(
        &self,
        item_id: ItemId,
        sale_amount: i64,
        requester: &UserId,
    ) -> LootResult<SaleOutcome> {
        let item = self.storage.fetch_item(item_id).await?;

        if !item.status.can_transition_to(ItemStatus::Distributed) {
            tracing::warn!(
                item_id = %item_id,
                status = %item.status,
                sale_amount = ?item.sale_amount,
                "sell rejected: item already distributed"
            );
            return Err(LootError::InvalidState {
                item_id,
                status: item.status,
                sale_amount: item.sale_amount,
            });
        }
        if &item.assigned_to != requester {
            tracing::warn!(item_id = %item_id, requester = %requester, "sell rejected: not the seller");
            return Err(LootError::Unauthorized {
                item_id,
                requester: requester.clone(),
            });
        }
        self.check_sale_amount(sale_amount)?;

        let allocation = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            allocate_shares(
                sale_amount,
                &item.participant_ids(),
                &item.assigned_to,
                &mut *rng,
            )?
        };

        let records = match self
            .storage
            .record_distribution(item_id, &item.assigned_to, sale_amount, &allocation.shares)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                let err = LootError::from(err);
                tracing::warn!(item_id = %item_id, code = err.code().as_str(), error = %err, "sale not recorded");
                return Err(err);
            }
        };

        let distributed_at = records
            .first()
            .map(|record| record.transaction_date)
            .unwrap_or(item.updated_at);
        let mut item = item;
        item.status = ItemStatus::Distributed;
        item.sale_amount = Some(sale_amount);
        item.updated_at = distributed_at;
        for participant in &mut item.participants {
            participant.share_amount = allocation.share_of(&participant.user_id);
        }

        tracing::info!(
            item_id = %item_id,
            sale_amount,
            base_share = allocation.base_share,
            remainder = allocation.remainder,
            random_bonus = allocation.random_bonus.len(),
            "item sold and proceeds distributed"
        );

        Ok(SaleOutcome {
            item,
            allocation,
            records,
        })
    }

    fn check_sale_amount(&self, sale_amount: i64) -> LootResult<()> {
        if sale_amount < 0 {
            return Err(LootError::validation(format!(
                "sale amount {sale_amount} is negative"
            )));
        }
        if sale_amount == 0 && !self.policy.allow_zero_sale {
            return Err(LootError::validation("sale amount must be positive"));
        }
        Ok(())
    }
}
