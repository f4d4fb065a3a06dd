//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{LogPage, LogQuery, LogRow, entry_from_row};
use super::{IdentityDirectory, LogStore};
use crate::config::GatewayConfig;
use crate::domain::timestamp::storage_now;
use crate::domain::{Caller, NewLogEntry, UserId};
use crate::error::{GatewayError, ReferenceKind};
use crate::service::ingestion::TrustedBatch;

/// Foreign key from `pos_offline_log.session_id` to `pos_sessions.id`.
const SESSION_FK: &str = "pos_offline_log_session_id_fkey";

/// Foreign key from `pos_offline_log.user_id` to `users.id`.
const USER_FK: &str = "pos_offline_log_user_id_fkey";

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from the configuration and, when enabled,
    /// applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        if config.database_run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
            tracing::info!("database migrations applied");
        }

        Ok(Self::new(pool))
    }
}

/// Maps an insert failure to a dangling-reference error when a foreign key
/// of the log table was violated.
fn classify_insert_error(err: sqlx::Error, entry: &NewLogEntry) -> GatewayError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_foreign_key_violation()
    {
        match db_err.constraint() {
            Some(SESSION_FK) => {
                return GatewayError::InvalidReference {
                    kind: ReferenceKind::Session,
                    id: entry.session_id.get(),
                };
            }
            Some(USER_FK) => {
                return GatewayError::InvalidReference {
                    kind: ReferenceKind::User,
                    id: entry.user_id.get(),
                };
            }
            _ => {}
        }
    }
    GatewayError::from(err)
}

#[async_trait]
impl LogStore for PostgresStore {
    async fn insert_batch(&self, batch: TrustedBatch) -> Result<Vec<i64>, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(batch.len());

        // Dropping `tx` on an early return rolls the whole batch back.
        for entry in batch.entries() {
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO pos_offline_log (session_id, user_id, timestamp, event_type, details) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(entry.session_id.get())
            .bind(entry.user_id.get())
            .bind(entry.timestamp.unwrap_or_else(storage_now))
            .bind(entry.event_type.as_str())
            .bind(entry.details.as_deref())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify_insert_error(e, entry))?;
            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    async fn list(&self, query: &LogQuery) -> Result<LogPage, GatewayError> {
        let session_id = query.session_id.map(|id| id.get());
        let user_id = query.user_id.map(|id| id.get());
        let event_type = query.event_type.map(|kind| kind.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pos_offline_log \
             WHERE ($1::BIGINT IS NULL OR session_id = $1) \
               AND ($2::BIGINT IS NULL OR user_id = $2) \
               AND ($3::TEXT IS NULL OR event_type = $3)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(event_type)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT id, session_id, user_id, timestamp, event_type, details FROM pos_offline_log \
             WHERE ($1::BIGINT IS NULL OR session_id = $1) \
               AND ($2::BIGINT IS NULL OR user_id = $2) \
               AND ($3::TEXT IS NULL OR event_type = $3) \
             ORDER BY timestamp ASC, id ASC \
             OFFSET $4 LIMIT $5",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(event_type)
        .bind(i64::from(query.offset))
        .bind(i64::from(query.limit))
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LogPage {
            entries,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}

#[async_trait]
impl IdentityDirectory for PostgresStore {
    async fn resolve_token(&self, token: &str) -> Result<Option<Caller>, GatewayError> {
        let row = sqlx::query_as::<_, (i64, String, bool)>(
            "SELECT u.id, u.login, u.is_pos_operator FROM api_tokens t \
             JOIN users u ON u.id = t.user_id WHERE t.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, login, is_pos_operator)| Caller {
            user_id: UserId::new(id),
            login,
            is_pos_operator,
        }))
    }
}
