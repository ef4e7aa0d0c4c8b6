//! Durable ballot store: one SQLite row per voter.
//!
//! Writes go through `INSERT ... ON CONFLICT DO UPDATE`, so a voter's row is
//! replaced whole and concurrent writers can never mix versions of unrelated
//! voters. Transient failures are retried a bounded number of times here, not
//! at call sites.

use crate::errors::{Error, Result};
use crate::models::Ballot;
use chrono::{DateTime, Utc};
use log::warn;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Row, Sqlite,
};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(150);

pub struct BallotStore {
    pool: SqlitePool,
}

/// Result of a lenient load: ballots that could be read, plus the error when
/// the store was unreadable and had to be treated as empty.
pub struct BallotSnapshot {
    pub ballots: BTreeMap<String, Ballot>,
    pub read_error: Option<Error>,
}

impl BallotStore {
    pub async fn open(database_url: &str) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            Sqlite::create_database(database_url)
                .await
                .map_err(|e| Error::store_write(format!("cannot create {database_url}: {e}")))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| Error::store_read(format!("cannot open {database_url}: {e}")))?;

        Self::init_schema(&pool)
            .await
            .map_err(|e| Error::store_write(format!("cannot initialize schema: {e}")))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ballots (
                voter TEXT PRIMARY KEY,
                selected_ids TEXT NOT NULL,
                finalized BOOLEAN NOT NULL DEFAULT FALSE,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Every known ballot, draft or finalized, keyed by voter.
    pub async fn load_all(&self) -> Result<BTreeMap<String, Ballot>> {
        let rows = retried("load ballots", || {
            sqlx::query("SELECT voter, selected_ids, finalized, updated_at FROM ballots")
                .fetch_all(&self.pool)
        })
        .await
        .map_err(|e| Error::store_read(e.to_string()))?;

        let mut ballots = BTreeMap::new();
        for row in rows {
            let ballot = ballot_from_row(&row)?;
            ballots.insert(ballot.voter.clone(), ballot);
        }
        Ok(ballots)
    }

    /// Like [`load_all`](Self::load_all) but fails soft: an unreadable store
    /// yields an empty mapping and the error as a recoverable signal.
    pub async fn load_all_lenient(&self) -> BallotSnapshot {
        match self.load_all().await {
            Ok(ballots) => BallotSnapshot {
                ballots,
                read_error: None,
            },
            Err(e) => {
                warn!("ballot store unreadable, treating as empty: {e}");
                BallotSnapshot {
                    ballots: BTreeMap::new(),
                    read_error: Some(e),
                }
            }
        }
    }

    /// One voter's ballot, if any.
    pub async fn get(&self, voter: &str) -> Result<Option<Ballot>> {
        let row = retried("load ballot", || {
            sqlx::query("SELECT voter, selected_ids, finalized, updated_at FROM ballots WHERE voter = ?")
                .bind(voter)
                .fetch_optional(&self.pool)
        })
        .await
        .map_err(|e| Error::store_read(e.to_string()))?;

        row.as_ref().map(ballot_from_row).transpose()
    }

    /// Write or overwrite exactly one voter's ballot. Identical arguments
    /// leave the store in an identical state.
    pub async fn upsert(&self, ballot: &Ballot) -> Result<()> {
        let selected: Vec<u32> = ballot.selected.iter().copied().collect();
        let selected_json = serde_json::to_string(&selected)
            .map_err(|e| Error::store_write(format!("cannot encode selections: {e}")))?;
        let updated_at = ballot.updated_at.to_rfc3339();

        retried("upsert ballot", || {
            sqlx::query(
                r#"
                INSERT INTO ballots (voter, selected_ids, finalized, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(voter)
                DO UPDATE SET selected_ids = excluded.selected_ids,
                              finalized = excluded.finalized,
                              updated_at = excluded.updated_at
                "#,
            )
            .bind(&ballot.voter)
            .bind(&selected_json)
            .bind(ballot.finalized)
            .bind(&updated_at)
            .execute(&self.pool)
        })
        .await
        .map_err(|e| Error::store_write(e.to_string()))?;

        Ok(())
    }

    /// Remove one voter's ballot entirely. Returns whether a row existed.
    pub async fn delete(&self, voter: &str) -> Result<bool> {
        let done = retried("delete ballot", || {
            sqlx::query("DELETE FROM ballots WHERE voter = ?")
                .bind(voter)
                .execute(&self.pool)
        })
        .await
        .map_err(|e| Error::store_write(e.to_string()))?;

        Ok(done.rows_affected() > 0)
    }

    /// Remove every ballot. Returns the number of rows dropped.
    pub async fn clear(&self) -> Result<u64> {
        let done = retried("clear ballots", || {
            sqlx::query("DELETE FROM ballots").execute(&self.pool)
        })
        .await
        .map_err(|e| Error::store_write(e.to_string()))?;

        Ok(done.rows_affected())
    }
}

fn ballot_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Ballot> {
    let voter = row.get::<String, _>("voter");
    let selected_json = row.get::<String, _>("selected_ids");
    let finalized = row.get::<bool, _>("finalized");
    let updated_at_raw = row.get::<String, _>("updated_at");

    let selected: BTreeSet<u32> = serde_json::from_str::<Vec<u32>>(&selected_json)
        .map_err(|e| Error::store_read(format!("corrupt selections for {voter:?}: {e}")))?
        .into_iter()
        .collect();

    let updated_at = DateTime::parse_from_rfc3339(&updated_at_raw)
        .map_err(|e| Error::store_read(format!("corrupt timestamp for {voter:?}: {e}")))?
        .with_timezone(&Utc);

    Ok(Ballot {
        voter,
        selected,
        finalized,
        updated_at,
    })
}

/// Run a store operation with bounded retry and a fixed backoff.
async fn retried<T, F, Fut>(what: &str, mut op: F) -> sqlx::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = sqlx::Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < RETRY_ATTEMPTS => {
                warn!("{what} failed (attempt {attempt}/{RETRY_ATTEMPTS}): {e}");
                tokio::time::sleep(RETRY_BACKOFF).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn scratch_store() -> (TempDir, BallotStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("ballots.db").display());
        let store = BallotStore::open(&url).await.unwrap();
        (dir, store)
    }

    fn ballot(voter: &str, ids: &[u32], finalized: bool) -> Ballot {
        Ballot::new(voter.to_string(), ids.iter().copied().collect(), finalized)
    }

    #[tokio::test]
    async fn upsert_then_load_all_round_trips() {
        let (_dir, store) = scratch_store().await;
        store.upsert(&ballot("alice", &[1, 2], true)).await.unwrap();

        let all = store.load_all().await.unwrap();
        let stored = &all["alice"];
        assert_eq!(stored.selected, BTreeSet::from([1, 2]));
        assert!(stored.finalized);
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let (_dir, store) = scratch_store().await;
        let b = ballot("alice", &[3, 1], false);
        store.upsert(&b).await.unwrap();
        let once = store.load_all().await.unwrap();
        store.upsert(&b).await.unwrap();
        let twice = store.load_all().await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn upsert_overwrites_one_voter_only() {
        let (_dir, store) = scratch_store().await;
        store.upsert(&ballot("alice", &[1], false)).await.unwrap();
        store.upsert(&ballot("bob", &[2], true)).await.unwrap();
        store.upsert(&ballot("alice", &[1, 3], true)).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["alice"].selected, BTreeSet::from([1, 3]));
        assert_eq!(all["bob"].selected, BTreeSet::from([2]));
    }

    #[tokio::test]
    async fn get_delete_and_clear() {
        let (_dir, store) = scratch_store().await;
        store.upsert(&ballot("alice", &[1], false)).await.unwrap();
        store.upsert(&ballot("bob", &[2], false)).await.unwrap();

        assert!(store.get("alice").await.unwrap().is_some());
        assert!(store.get("carol").await.unwrap().is_none());

        assert!(store.delete("alice").await.unwrap());
        assert!(!store.delete("alice").await.unwrap());
        assert!(store.get("alice").await.unwrap().is_none());

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lenient_load_treats_unreadable_store_as_empty() {
        let (_dir, store) = scratch_store().await;
        store.upsert(&ballot("alice", &[1], true)).await.unwrap();

        // Simulate a corrupt store: the table the reader expects is gone.
        sqlx::query("DROP TABLE ballots")
            .execute(store.pool())
            .await
            .unwrap();

        assert!(store.load_all().await.is_err());
        let snapshot = store.load_all_lenient().await;
        assert!(snapshot.ballots.is_empty());
        assert!(matches!(snapshot.read_error, Some(Error::StoreRead { .. })));
    }

    #[tokio::test]
    async fn corrupt_row_surfaces_as_store_read_error() {
        let (_dir, store) = scratch_store().await;
        sqlx::query(
            "INSERT INTO ballots (voter, selected_ids, finalized, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind("mallory")
        .bind("not json")
        .bind(false)
        .bind(Utc::now().to_rfc3339())
        .execute(store.pool())
        .await
        .unwrap();

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, Error::StoreRead { .. }));
    }
}
