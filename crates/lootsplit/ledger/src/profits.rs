//! Read views over the profit ledger.

use crate::error::LootResult;
use chrono::{DateTime, Utc};
use lootsplit_storage::LootStorage;
use lootsplit_types::{ProfitRecord, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One user's standing on the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub user_id: UserId,
    pub total: i64,
    /// Number of ledger rows that contributed to `total`.
    pub distributions: usize,
    pub last_profit_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Sum over the listed entries.
    pub group_total: i64,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_for(&self, user_id: &UserId) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|entry| &entry.user_id == user_id)
    }
}

/// Rank users by accumulated profit.
///
/// Users whose total is zero or less are left out. Ties on total are broken
/// by user ID so the order never depends on record order.
pub fn build_leaderboard(records: &[ProfitRecord]) -> Leaderboard {
    let mut totals: BTreeMap<&UserId, (i64, usize, DateTime<Utc>)> = BTreeMap::new();
    for record in records {
        let entry = totals
            .entry(&record.user_id)
            .or_insert((0, 0, record.transaction_date));
        entry.0 = entry.0.saturating_add(record.amount);
        entry.1 += 1;
        entry.2 = entry.2.max(record.transaction_date);
    }

    let mut ranked = totals
        .into_iter()
        .filter(|(_, (total, _, _))| *total > 0)
        .collect::<Vec<_>>();
    // Stable sort keeps the BTreeMap's ascending user order among equal totals.
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));

    let entries = ranked
        .into_iter()
        .enumerate()
        .map(
            |(idx, (user_id, (total, distributions, last_profit_at)))| LeaderboardEntry {
                rank: idx + 1,
                user_id: user_id.clone(),
                total,
                distributions,
                last_profit_at,
            },
        )
        .collect::<Vec<_>>();
    let group_total = entries
        .iter()
        .fold(0i64, |acc, entry| acc.saturating_add(entry.total));

    Leaderboard {
        entries,
        group_total,
    }
}

/// Ledger facade over the shared store.
#[derive(Clone)]
pub struct ProfitLedger {
    storage: Arc<dyn LootStorage>,
}

impl ProfitLedger {
    pub fn new(storage: Arc<dyn LootStorage>) -> Self {
        Self { storage }
    }

    pub async fn all_records(&self) -> LootResult<Vec<ProfitRecord>> {
        Ok(self.storage.list_profit_records().await?)
    }

    pub async fn leaderboard(&self) -> LootResult<Leaderboard> {
        let records = self.storage.list_profit_records().await?;
        let board = build_leaderboard(&records);
        tracing::debug!(
            records = records.len(),
            ranked = board.entries.len(),
            "leaderboard built"
        );
        Ok(board)
    }

    /// Leaderboard view as rendered by the profits command.
    pub async fn profits_report(&self) -> LootResult<Leaderboard> {
        self.leaderboard().await
    }

    /// A user's ledger rows, newest first.
    pub async fn user_history(&self, user_id: &UserId) -> LootResult<Vec<ProfitRecord>> {
        Ok(self.storage.user_profit_records(user_id).await?)
    }

    pub async fn user_total(&self, user_id: &UserId) -> LootResult<i64> {
        Ok(self.storage.user_profit_total(user_id).await?)
    }
}
