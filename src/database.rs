//! Persistent SQLite-backed fingerprint store

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::EngineError;
use crate::fingerprint::Fingerprint;
use crate::index::{FingerprintStore, TrackId};

/// SQLite-backed inverted index.
///
/// Posting lists are JSON arrays of track ids keyed by hash. Together with
/// the stable hash format this makes a database written by one build
/// readable by any later build with the same analysis parameters.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database at `url`, creating it if missing, and bring the
    /// schema up to date.
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        // A single writer connection; SQLite serializes writes anyway and
        // this keeps `sqlite::memory:` pools on one shared database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl FingerprintStore for SqliteStore {
    async fn save_track(
        &self,
        title: &str,
        fingerprints: &[Fingerprint],
    ) -> Result<TrackId, EngineError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query("INSERT INTO tracks (title) VALUES (?)")
            .bind(title)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for fp in fingerprints {
            sqlx::query(
                "INSERT INTO fingerprints (hash, track_ids) VALUES (?, json('[]')) \
                 ON CONFLICT(hash) DO NOTHING",
            )
            .bind(&fp.hash)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "UPDATE fingerprints SET track_ids = json_insert(track_ids, '$[#]', ?) \
                 WHERE hash = ?",
            )
            .bind(id)
            .bind(&fp.hash)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            track_id = id,
            title,
            postings = fingerprints.len(),
            "track persisted"
        );
        Ok(id)
    }

    async fn lookup(&self, hash: &str) -> Result<Vec<TrackId>, EngineError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT track_ids FROM fingerprints WHERE hash = ?")
                .bind(hash)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((json,)) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn title_of(&self, id: TrackId) -> Result<String, EngineError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT title FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(title,)| title)
            .ok_or(EngineError::TrackNotFound(id))
    }

    async fn list_titles(&self) -> Result<Vec<String>, EngineError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT title FROM tracks ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(title,)| title).collect())
    }
}
