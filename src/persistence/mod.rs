//! Persistence layer: offline log storage and host identity lookup.
//!
//! Provides the [`LogStore`] and [`IdentityDirectory`] traits. The
//! PostgreSQL implementation uses `sqlx::PgPool`; [`MemoryStore`] keeps
//! everything in process for tests and single-node demos.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use models::{LogPage, LogQuery};
pub use postgres::PostgresStore;

use crate::domain::Caller;
use crate::error::GatewayError;
use crate::service::ingestion::TrustedBatch;

/// Durable storage for offline log entries.
#[async_trait]
pub trait LogStore: Send + Sync + fmt::Debug {
    /// Stores every entry of `batch` atomically and returns the new row ids
    /// in batch order.
    ///
    /// Entries without a timestamp receive the current server time.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidReference`] if an entry points at a
    /// session or user that does not exist, or
    /// [`GatewayError::PersistenceError`] on any other storage failure. No
    /// entry of the batch is stored in either case.
    async fn insert_batch(&self, batch: TrustedBatch) -> Result<Vec<i64>, GatewayError>;

    /// Returns one page of stored entries ordered by ascending timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn list(&self, query: &LogQuery) -> Result<LogPage, GatewayError>;
}

/// Host-owned directory mapping bearer tokens to users.
#[async_trait]
pub trait IdentityDirectory: Send + Sync + fmt::Debug {
    /// Resolves an opaque bearer token to the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn resolve_token(&self, token: &str) -> Result<Option<Caller>, GatewayError>;
}
