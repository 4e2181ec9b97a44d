//! SQLite adapter for lootsplit storage.
//!
//! This adapter is the transactional source-of-truth backend. Every multi-row
//! mutation runs in one transaction; the lifecycle transition is a conditional
//! `UPDATE ... WHERE status = 'assigned'` with an affected-row check so two
//! concurrent sales of the same item cannot both commit.

use crate::guard::{check_new_item, check_share_mapping};
use crate::traits::{ItemStore, ProfitHistoryStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lootsplit_types::{
    Item, ItemId, ItemStatus, NewItem, Participant, ParticipantShare, ProfitRecord, UserId,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashMap;
use std::time::Duration;

/// SQLite-backed storage adapter.
#[derive(Clone)]
pub struct SqliteLootStorage {
    pool: SqlitePool,
}

impl SqliteLootStorage {
    /// Connect to SQLite and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 5, 5).await
    }

    /// Connect with explicit pool parameters.
    ///
    /// In-memory URLs are pinned to a single long-lived connection; every new
    /// connection would otherwise open its own empty database.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let mut options =
            SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(connect_timeout_secs));
        options = if in_memory {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(max_connections.max(1))
        };

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect sqlite: {e}")))?;
        Self::from_pool(pool).await
    }

    /// In-memory database, mostly for tests.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                estimated_value INTEGER NOT NULL,
                status TEXT NOT NULL,
                assigned_to TEXT NOT NULL,
                sale_amount INTEGER,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES items(id),
                user_id TEXT NOT NULL,
                share_amount INTEGER,
                UNIQUE (item_id, user_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS profit_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                item_id INTEGER NOT NULL REFERENCES items(id),
                amount INTEGER NOT NULL,
                transaction_date TIMESTAMP NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_profit_history_user ON profit_history (user_id)",
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    async fn load_participants(
        &self,
        item_ids: &[ItemId],
    ) -> StorageResult<HashMap<ItemId, Vec<Participant>>> {
        let mut grouped: HashMap<ItemId, Vec<Participant>> = HashMap::new();
        if item_ids.is_empty() {
            return Ok(grouped);
        }

        let placeholders = vec!["?"; item_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, item_id, user_id, share_amount FROM participants \
             WHERE item_id IN ({placeholders}) ORDER BY id ASC"
        );
        let mut query = sqlx::query(&sql);
        for item_id in item_ids {
            query = query.bind(item_id.0);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;

        for row in rows {
            let participant = participant_row(&row)?;
            grouped
                .entry(participant.item_id)
                .or_default()
                .push(participant);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ItemStore for SqliteLootStorage {
    async fn create_item(&self, item: NewItem) -> StorageResult<Item> {
        check_new_item(&item)?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO items (name, estimated_value, status, assigned_to, sale_amount, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)
            "#,
        )
        .bind(&item.name)
        .bind(item.estimated_value)
        .bind(ItemStatus::Assigned.as_str())
        .bind(item.seller.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_conflict)?;
        let item_id = ItemId::new(inserted.last_insert_rowid());

        let mut participants = Vec::with_capacity(item.participants.len());
        for user_id in item.participants {
            let row = sqlx::query("INSERT INTO participants (item_id, user_id) VALUES (?1, ?2)")
                .bind(item_id.0)
                .bind(user_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_conflict)?;
            participants.push(Participant {
                participant_id: row.last_insert_rowid(),
                item_id,
                user_id,
                share_amount: None,
            });
        }

        tx.commit().await.map_err(backend)?;
        tracing::debug!(item_id = %item_id, "stored item in sqlite");

        Ok(Item {
            id: item_id,
            name: item.name,
            estimated_value: item.estimated_value,
            status: ItemStatus::Assigned,
            assigned_to: item.seller,
            sale_amount: None,
            created_at: now,
            updated_at: now,
            participants,
        })
    }

    async fn assign_seller(&self, item_id: ItemId, user_id: &UserId) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let is_participant = sqlx::query(
            "SELECT 1 FROM participants WHERE item_id = ?1 AND user_id = ?2",
        )
        .bind(item_id.0)
        .bind(user_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .is_some();

        let result = sqlx::query(
            r#"
            UPDATE items
               SET assigned_to = ?1,
                   status = ?2,
                   updated_at = ?3
             WHERE id = ?4
               AND status = ?2
            "#,
        )
        .bind(user_id.as_str())
        .bind(ItemStatus::Assigned.as_str())
        .bind(Utc::now())
        .bind(item_id.0)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() != 1 {
            return Err(explain_missed_transition(&mut tx, item_id, None).await);
        }
        if !is_participant {
            // Dropping the transaction rolls the update back.
            return Err(StorageError::InvalidInput(format!(
                "user {user_id} is not a participant of item {item_id}"
            )));
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn fetch_item(&self, item_id: ItemId) -> StorageResult<Item> {
        let row = sqlx::query(
            r#"
            SELECT id, name, estimated_value, status, assigned_to, sale_amount, created_at, updated_at
              FROM items
             WHERE id = ?1
            "#,
        )
        .bind(item_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or_else(|| StorageError::item_not_found(item_id))?;

        let mut item = item_row(&row)?;
        item.participants = self
            .load_participants(&[item_id])
            .await?
            .remove(&item_id)
            .unwrap_or_default();
        Ok(item)
    }

    async fn list_items(&self) -> StorageResult<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, estimated_value, status, assigned_to, sale_amount, created_at, updated_at
              FROM items
             ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut items = rows.iter().map(item_row).collect::<StorageResult<Vec<_>>>()?;
        let ids = items.iter().map(|item| item.id).collect::<Vec<_>>();
        let mut participants = self.load_participants(&ids).await?;
        for item in &mut items {
            item.participants = participants.remove(&item.id).unwrap_or_default();
        }
        Ok(items)
    }

    async fn record_distribution(
        &self,
        item_id: ItemId,
        seller: &UserId,
        sale_amount: i64,
        shares: &[ParticipantShare],
    ) -> StorageResult<Vec<ProfitRecord>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // The conditional update is the first statement so the write lock is
        // taken before anything is read.
        let result = sqlx::query(
            r#"
            UPDATE items
               SET status = ?1,
                   sale_amount = ?2,
                   updated_at = ?3
             WHERE id = ?4
               AND status = ?5
               AND assigned_to = ?6
            "#,
        )
        .bind(ItemStatus::Distributed.as_str())
        .bind(sale_amount)
        .bind(now)
        .bind(item_id.0)
        .bind(ItemStatus::Assigned.as_str())
        .bind(seller.as_str())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() != 1 {
            return Err(explain_missed_transition(&mut tx, item_id, Some(seller)).await);
        }

        let participant_ids = sqlx::query(
            "SELECT user_id FROM participants WHERE item_id = ?1 ORDER BY id ASC",
        )
        .bind(item_id.0)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?
        .iter()
        .map(|row| row.try_get::<String, _>("user_id").map(UserId::new))
        .collect::<Result<Vec<_>, _>>()
        .map_err(backend)?;
        check_share_mapping(&participant_ids, sale_amount, shares)?;

        let item_name: String = sqlx::query("SELECT name FROM items WHERE id = ?1")
            .bind(item_id.0)
            .fetch_one(&mut *tx)
            .await
            .and_then(|row| row.try_get("name"))
            .map_err(backend)?;

        let mut records = Vec::with_capacity(shares.len());
        for user_id in &participant_ids {
            let amount = shares
                .iter()
                .find(|share| &share.user_id == user_id)
                .map(|share| share.amount)
                .unwrap_or_default();

            let updated = sqlx::query(
                r#"
                UPDATE participants
                   SET share_amount = ?1
                 WHERE item_id = ?2
                   AND user_id = ?3
                   AND share_amount IS NULL
                "#,
            )
            .bind(amount)
            .bind(item_id.0)
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
            if updated.rows_affected() != 1 {
                return Err(StorageError::Conflict(format!(
                    "share for {user_id} on item {item_id} already set"
                )));
            }

            let inserted = sqlx::query(
                r#"
                INSERT INTO profit_history (user_id, item_id, amount, transaction_date)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(user_id.as_str())
            .bind(item_id.0)
            .bind(amount)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            records.push(ProfitRecord {
                id: inserted.last_insert_rowid(),
                user_id: user_id.clone(),
                item_id,
                item_name: item_name.clone(),
                amount,
                transaction_date: now,
            });
        }

        tx.commit().await.map_err(backend)?;
        tracing::debug!(item_id = %item_id, sale_amount, rows = records.len(), "recorded distribution in sqlite");
        Ok(records)
    }
}

#[async_trait]
impl ProfitHistoryStore for SqliteLootStorage {
    async fn list_profit_records(&self) -> StorageResult<Vec<ProfitRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.user_id, p.item_id, i.name AS item_name, p.amount, p.transaction_date
              FROM profit_history p
              JOIN items i ON p.item_id = i.id
             ORDER BY p.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(profit_row).collect()
    }

    async fn user_profit_records(&self, user_id: &UserId) -> StorageResult<Vec<ProfitRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.user_id, p.item_id, i.name AS item_name, p.amount, p.transaction_date
              FROM profit_history p
              JOIN items i ON p.item_id = i.id
             WHERE p.user_id = ?1
             ORDER BY p.transaction_date DESC, p.id DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(profit_row).collect()
    }

    async fn user_profit_total(&self, user_id: &UserId) -> StorageResult<i64> {
        sqlx::query("SELECT COALESCE(SUM(amount), 0) AS total FROM profit_history WHERE user_id = ?1")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get::<i64, _>("total"))
            .map_err(backend)
    }
}

/// Work out why a conditional update touched no rows.
async fn explain_missed_transition(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: ItemId,
    expected_seller: Option<&UserId>,
) -> StorageError {
    let row = match sqlx::query("SELECT status, sale_amount, assigned_to FROM items WHERE id = ?1")
        .bind(item_id.0)
        .fetch_optional(&mut **tx)
        .await
    {
        Ok(row) => row,
        Err(e) => return backend(e),
    };

    let Some(row) = row else {
        return StorageError::item_not_found(item_id);
    };
    let status = match row.try_get::<String, _>("status") {
        Ok(raw) => raw,
        Err(e) => return backend(e),
    };
    let status = match parse_status(&status) {
        Ok(status) => status,
        Err(e) => return e,
    };
    if let Some(seller) = expected_seller {
        let current = row.try_get::<String, _>("assigned_to").ok();
        if status == ItemStatus::Assigned && current.as_deref() != Some(seller.as_str()) {
            return StorageError::NotSeller {
                item_id,
                user_id: seller.clone(),
            };
        }
    }
    StorageError::InvalidState {
        item_id,
        status,
        sale_amount: row
            .try_get::<Option<i64>, _>("sale_amount")
            .ok()
            .flatten(),
    }
}

fn item_row(row: &SqliteRow) -> StorageResult<Item> {
    let status: String = row.try_get("status").map_err(backend)?;
    let assigned_to: String = row.try_get("assigned_to").map_err(backend)?;
    Ok(Item {
        id: ItemId::new(row.try_get("id").map_err(backend)?),
        name: row.try_get("name").map_err(backend)?,
        estimated_value: row.try_get("estimated_value").map_err(backend)?,
        status: parse_status(&status)?,
        assigned_to: UserId::new(assigned_to),
        sale_amount: row.try_get("sale_amount").map_err(backend)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(backend)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(backend)?,
        participants: Vec::new(),
    })
}

fn participant_row(row: &SqliteRow) -> StorageResult<Participant> {
    let user_id: String = row.try_get("user_id").map_err(backend)?;
    Ok(Participant {
        participant_id: row.try_get("id").map_err(backend)?,
        item_id: ItemId::new(row.try_get("item_id").map_err(backend)?),
        user_id: UserId::new(user_id),
        share_amount: row.try_get("share_amount").map_err(backend)?,
    })
}

fn profit_row(row: &SqliteRow) -> StorageResult<ProfitRecord> {
    let user_id: String = row.try_get("user_id").map_err(backend)?;
    Ok(ProfitRecord {
        id: row.try_get("id").map_err(backend)?,
        user_id: UserId::new(user_id),
        item_id: ItemId::new(row.try_get("item_id").map_err(backend)?),
        item_name: row.try_get("item_name").map_err(backend)?,
        amount: row.try_get("amount").map_err(backend)?,
        transaction_date: row
            .try_get::<DateTime<Utc>, _>("transaction_date")
            .map_err(backend)?,
    })
}

fn parse_status(raw: &str) -> StorageResult<ItemStatus> {
    raw.parse::<ItemStatus>()
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn map_sqlx_conflict(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::Conflict(db_err.message().to_string());
        }
    }
    StorageError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(name: &str, participants: &[&str], seller: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            estimated_value: 50,
            participants: participants.iter().map(|id| UserId::new(*id)).collect(),
            seller: UserId::new(seller),
        }
    }

    fn split(pairs: &[(&str, i64)]) -> Vec<ParticipantShare> {
        pairs
            .iter()
            .map(|(user, amount)| ParticipantShare::new(UserId::new(*user), *amount))
            .collect()
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let created = storage
            .create_item(new_item("Headhunter", &["a", "b", "c"], "a"))
            .await
            .unwrap();

        let fetched = storage.fetch_item(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Headhunter");
        assert_eq!(fetched.status, ItemStatus::Assigned);
        assert_eq!(fetched.assigned_to, UserId::new("a"));
        assert_eq!(fetched.sale_amount, None);
        assert_eq!(fetched.participant_ids(), created.participant_ids());
        assert!(fetched.participants.iter().all(|p| p.share_amount.is_none()));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let result = storage.fetch_item(ItemId::new(404)).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_participant_rolls_back_item_row() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let result = storage
            .create_item(new_item("Mageblood", &["a", "b", "a"], "a"))
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert!(storage.list_items().await.unwrap().is_empty());

        let orphans: i64 = sqlx::query("SELECT COUNT(*) AS n FROM participants")
            .fetch_one(storage.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn distribution_sets_shares_and_ledger() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let item = storage
            .create_item(new_item("Mirror", &["a", "b", "c"], "a"))
            .await
            .unwrap();

        let records = storage
            .record_distribution(item.id, &UserId::new("a"), 100, &split(&[("a", 34), ("b", 33), ("c", 33)]))
            .await
            .unwrap();
        assert_eq!(records.iter().map(|r| r.amount).sum::<i64>(), 100);
        assert!(records.iter().all(|r| r.item_name == "Mirror"));

        let stored = storage.fetch_item(item.id).await.unwrap();
        assert_eq!(stored.status, ItemStatus::Distributed);
        assert_eq!(stored.sale_amount, Some(100));
        assert_eq!(stored.share_of(&UserId::new("a")), Some(34));

        let again = storage
            .record_distribution(item.id, &UserId::new("a"), 1, &split(&[("a", 1), ("b", 0), ("c", 0)]))
            .await;
        assert!(matches!(
            again,
            Err(StorageError::InvalidState {
                sale_amount: Some(100),
                ..
            })
        ));
        assert_eq!(storage.fetch_item(item.id).await.unwrap(), stored);
        assert_eq!(storage.list_profit_records().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_ledger_insert_rolls_back_transition() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let item = storage
            .create_item(new_item("Mirror", &["a", "b"], "a"))
            .await
            .unwrap();
        let before = storage.fetch_item(item.id).await.unwrap();

        sqlx::query("DROP TABLE profit_history")
            .execute(storage.pool())
            .await
            .unwrap();

        let result = storage
            .record_distribution(item.id, &UserId::new("a"), 10, &split(&[("a", 5), ("b", 5)]))
            .await;
        assert!(matches!(result, Err(StorageError::Backend(_))));

        let after = storage.fetch_item(item.id).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after.status, ItemStatus::Assigned);
    }

    #[tokio::test]
    async fn mismatched_shares_roll_back_transition() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let item = storage
            .create_item(new_item("Mirror", &["a", "b"], "a"))
            .await
            .unwrap();

        let result = storage
            .record_distribution(item.id, &UserId::new("a"), 10, &split(&[("a", 5), ("z", 5)]))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
        assert_eq!(storage.fetch_item(item.id).await.unwrap().status, ItemStatus::Assigned);
    }

    #[tokio::test]
    async fn assign_seller_requires_participant() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let item = storage
            .create_item(new_item("Mirror", &["a", "b"], "a"))
            .await
            .unwrap();

        storage.assign_seller(item.id, &UserId::new("b")).await.unwrap();
        assert_eq!(
            storage.fetch_item(item.id).await.unwrap().assigned_to,
            UserId::new("b")
        );

        let outsider = storage.assign_seller(item.id, &UserId::new("z")).await;
        assert!(matches!(outsider, Err(StorageError::InvalidInput(_))));
        assert_eq!(
            storage.fetch_item(item.id).await.unwrap().assigned_to,
            UserId::new("b")
        );

        let missing = storage.assign_seller(ItemId::new(77), &UserId::new("a")).await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn distribution_requires_current_seller() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let item = storage
            .create_item(new_item("Mirror", &["a", "b"], "a"))
            .await
            .unwrap();
        storage.assign_seller(item.id, &UserId::new("b")).await.unwrap();
        let before = storage.fetch_item(item.id).await.unwrap();

        let stale = storage
            .record_distribution(item.id, &UserId::new("a"), 10, &split(&[("a", 5), ("b", 5)]))
            .await;
        assert!(matches!(stale, Err(StorageError::NotSeller { .. })));
        assert_eq!(storage.fetch_item(item.id).await.unwrap(), before);
        assert!(storage.list_profit_records().await.unwrap().is_empty());

        storage
            .record_distribution(item.id, &UserId::new("b"), 10, &split(&[("a", 5), ("b", 5)]))
            .await
            .unwrap();
        let late = storage
            .record_distribution(item.id, &UserId::new("a"), 10, &split(&[("a", 5), ("b", 5)]))
            .await;
        assert!(matches!(
            late,
            Err(StorageError::InvalidState {
                sale_amount: Some(10),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn profit_queries_filter_and_total() {
        let storage = SqliteLootStorage::in_memory().await.unwrap();
        let first = storage
            .create_item(new_item("First", &["a", "b"], "a"))
            .await
            .unwrap();
        let second = storage
            .create_item(new_item("Second", &["a"], "a"))
            .await
            .unwrap();
        storage
            .record_distribution(first.id, &UserId::new("a"), 9, &split(&[("a", 5), ("b", 4)]))
            .await
            .unwrap();
        storage
            .record_distribution(second.id, &UserId::new("a"), 3, &split(&[("a", 3)]))
            .await
            .unwrap();

        let history = storage.user_profit_records(&UserId::new("a")).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].item_name, "Second");
        assert_eq!(storage.user_profit_total(&UserId::new("a")).await.unwrap(), 8);
        assert_eq!(storage.user_profit_total(&UserId::new("b")).await.unwrap(), 4);
        assert_eq!(storage.user_profit_total(&UserId::new("c")).await.unwrap(), 0);

        let items = storage.list_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].participants.len(), 2);
    }
}
