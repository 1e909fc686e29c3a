//! PostgreSQL storage implementation
//!
//! Uniqueness of `(raid_id, user_id)` is a table constraint and every ledger
//! write is a single `INSERT ... SELECT ... ON CONFLICT` statement whose
//! `SELECT` carries the "raid still open" predicate. The `SELECT` share-locks
//! the raid row, so a concurrent close either waits for the write or makes
//! the predicate fail on re-check.

use crate::traits::{AttendanceStore, CloseOutcome, LedgerWrite, RaidStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use raid_types::{AttendanceEntry, AttendanceStatus, Raid, RaidId, RaidState, UserId};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

/// PostgreSQL-backed raid storage
#[derive(Debug, Clone)]
pub struct PostgresRaidStorage {
    pool: PgPool,
}

impl PostgresRaidStorage {
    /// Connect to PostgreSQL and initialize schema
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    /// Close the pool; pending queries finish first.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn initialize_schema(&self) -> StorageResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS raids (
                id UUID PRIMARY KEY,
                subject TEXT NOT NULL,
                boosted BOOLEAN NOT NULL,
                invite_window_ms BIGINT NOT NULL,
                initiator_id TEXT NOT NULL,
                state TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS raids_open_expiry ON raids(state, expires_at);"#,
            r#"
            CREATE TABLE IF NOT EXISTS attendance (
                sequence BIGSERIAL PRIMARY KEY,
                raid_id UUID NOT NULL REFERENCES raids(id),
                user_id TEXT NOT NULL,
                status TEXT NOT NULL,
                first_responded_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                UNIQUE (raid_id, user_id)
            );
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;
        }

        Ok(())
    }

    /// Distinguish a missing raid from a closed one after a rejected write.
    async fn rejection<T>(&self, raid_id: &RaidId) -> StorageResult<LedgerWrite<T>> {
        let exists = sqlx::query("SELECT 1 FROM raids WHERE id = $1")
            .bind(raid_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(if exists.is_some() {
            LedgerWrite::RaidNotOpen
        } else {
            LedgerWrite::RaidMissing
        })
    }
}

fn raid_from_row(row: &PgRow) -> StorageResult<Raid> {
    let state: String = row.try_get("state").map_err(query_err)?;
    let window_ms: i64 = row.try_get("invite_window_ms").map_err(query_err)?;
    let id: Uuid = row.try_get("id").map_err(query_err)?;
    Ok(Raid {
        id: RaidId::from_uuid(id),
        subject: row.try_get("subject").map_err(query_err)?,
        boosted: row.try_get("boosted").map_err(query_err)?,
        invite_window: Duration::from_millis(window_ms.max(0) as u64),
        initiator_id: UserId::new(row.try_get::<String, _>("initiator_id").map_err(query_err)?),
        state: RaidState::parse(&state)
            .ok_or_else(|| StorageError::Serialization(format!("unknown raid state '{}'", state)))?,
        created_at: row.try_get("created_at").map_err(query_err)?,
    })
}

fn entry_from_row(raid_id: RaidId, row: &PgRow) -> StorageResult<AttendanceEntry> {
    let status: String = row.try_get("status").map_err(query_err)?;
    let sequence: i64 = row.try_get("sequence").map_err(query_err)?;
    Ok(AttendanceEntry {
        raid_id,
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(query_err)?),
        status: AttendanceStatus::parse(&status).ok_or_else(|| {
            StorageError::Serialization(format!("unknown attendance status '{}'", status))
        })?,
        first_responded_at: row.try_get("first_responded_at").map_err(query_err)?,
        updated_at: row.try_get("updated_at").map_err(query_err)?,
        sequence: sequence as u64,
    })
}

fn query_err(e: sqlx::Error) -> StorageError {
    StorageError::Query(e.to_string())
}

#[async_trait]
impl RaidStore for PostgresRaidStorage {
    async fn insert_raid(&self, raid: Raid) -> StorageResult<AttendanceEntry> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        sqlx::query(
            r#"
            INSERT INTO raids (id, subject, boosted, invite_window_ms, initiator_id, state, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(raid.id.as_uuid())
        .bind(&raid.subject)
        .bind(raid.boosted)
        .bind(raid.invite_window.as_millis() as i64)
        .bind(raid.initiator_id.as_str())
        .bind(raid.state.as_str())
        .bind(raid.created_at)
        .bind(raid.expires_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::Conflict(format!("raid {} already exists", raid.id))
            }
            other => query_err(other),
        })?;

        let row = sqlx::query(
            r#"
            INSERT INTO attendance (raid_id, user_id, status, first_responded_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING sequence, user_id, status, first_responded_at, updated_at
            "#,
        )
        .bind(raid.id.as_uuid())
        .bind(raid.initiator_id.as_str())
        .bind(AttendanceStatus::Going.as_str())
        .bind(raid.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        let entry = entry_from_row(raid.id, &row)?;
        tx.commit().await.map_err(query_err)?;
        Ok(entry)
    }

    async fn get_raid(&self, raid_id: &RaidId) -> StorageResult<Option<Raid>> {
        let row = sqlx::query("SELECT * FROM raids WHERE id = $1")
            .bind(raid_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;
        row.as_ref().map(raid_from_row).transpose()
    }

    async fn close_raid(&self, raid_id: &RaidId) -> StorageResult<CloseOutcome> {
        let updated = sqlx::query("UPDATE raids SET state = $2 WHERE id = $1 AND state = $3")
            .bind(raid_id.as_uuid())
            .bind(RaidState::Closed.as_str())
            .bind(RaidState::Open.as_str())
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        if updated.rows_affected() > 0 {
            return Ok(CloseOutcome::Closed);
        }

        match self.rejection::<()>(raid_id).await? {
            LedgerWrite::RaidMissing => {
                Err(StorageError::NotFound(format!("raid {} not found", raid_id)))
            }
            _ => Ok(CloseOutcome::AlreadyClosed),
        }
    }

    async fn list_open_raids(
        &self,
        as_of: DateTime<Utc>,
        limit: usize,
    ) -> StorageResult<Vec<Raid>> {
        // LIMIT NULL is unlimited
        let limit = (limit > 0).then_some(limit as i64);
        let rows = sqlx::query(
            r#"
            SELECT * FROM raids
            WHERE state = $1 AND created_at <= $2 AND expires_at > $2
            ORDER BY created_at DESC, id ASC
            LIMIT $3
            "#,
        )
        .bind(RaidState::Open.as_str())
        .bind(as_of)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;
        rows.iter().map(raid_from_row).collect()
    }

    async fn list_expired_open_raids(&self, as_of: DateTime<Utc>) -> StorageResult<Vec<Raid>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM raids
            WHERE state = $1 AND expires_at <= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(RaidState::Open.as_str())
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;
        rows.iter().map(raid_from_row).collect()
    }
}

#[async_trait]
impl AttendanceStore for PostgresRaidStorage {
    async fn upsert_attendance(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<LedgerWrite<AttendanceEntry>> {
        let row = sqlx::query(
            r#"
            INSERT INTO attendance (raid_id, user_id, status, first_responded_at, updated_at)
            SELECT r.id, $2, $3, $4, $4 FROM raids r
            WHERE r.id = $1 AND r.state = $5 AND r.created_at <= $4 AND r.expires_at > $4
            FOR SHARE OF r
            ON CONFLICT (raid_id, user_id)
            DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
            RETURNING sequence, user_id, status, first_responded_at, updated_at
            "#,
        )
        .bind(raid_id.as_uuid())
        .bind(user_id.as_str())
        .bind(status.as_str())
        .bind(at)
        .bind(RaidState::Open.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        match row {
            Some(row) => Ok(LedgerWrite::Applied(entry_from_row(*raid_id, &row)?)),
            None => self.rejection(raid_id).await,
        }
    }

    async fn list_attendance(&self, raid_id: &RaidId) -> StorageResult<Vec<AttendanceEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, user_id, status, first_responded_at, updated_at
            FROM attendance
            WHERE raid_id = $1
            ORDER BY first_responded_at ASC, sequence ASC
            "#,
        )
        .bind(raid_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;
        rows.iter().map(|row| entry_from_row(*raid_id, row)).collect()
    }

    async fn remove_attendance(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> StorageResult<LedgerWrite<bool>> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let open = sqlx::query(
            "SELECT 1 FROM raids WHERE id = $1 AND state = $2 AND created_at <= $3 AND expires_at > $3 FOR SHARE",
        )
        .bind(raid_id.as_uuid())
        .bind(RaidState::Open.as_str())
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;
        if open.is_none() {
            tx.rollback().await.map_err(query_err)?;
            return self.rejection(raid_id).await;
        }

        let deleted = sqlx::query("DELETE FROM attendance WHERE raid_id = $1 AND user_id = $2")
            .bind(raid_id.as_uuid())
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        tx.commit().await.map_err(query_err)?;
        Ok(LedgerWrite::Applied(deleted.rows_affected() > 0))
    }
}
