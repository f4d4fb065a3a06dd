//! In-process store with the same semantics as the PostgreSQL one.
//!
//! [`MemoryStore`] keeps host users, sessions, tokens and log rows behind a
//! single [`tokio::sync::RwLock`]. A batch insert checks every reference
//! before touching the log, so a dangling reference stores nothing.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{LogPage, LogQuery};
use super::{IdentityDirectory, LogStore};
use crate::domain::timestamp::storage_now;
use crate::domain::{Caller, OfflineLogEntry, SessionId, UserId};
use crate::error::{GatewayError, ReferenceKind};
use crate::service::ingestion::TrustedBatch;

#[derive(Debug)]
struct HostUser {
    login: String,
    is_pos_operator: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, HostUser>,
    sessions: HashSet<SessionId>,
    tokens: HashMap<String, UserId>,
    logs: Vec<OfflineLogEntry>,
    next_id: i64,
}

/// Volatile store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host user.
    pub async fn add_user(&self, id: UserId, login: &str, is_pos_operator: bool) {
        self.state.write().await.users.insert(
            id,
            HostUser {
                login: login.to_string(),
                is_pos_operator,
            },
        );
    }

    /// Registers an open POS session.
    pub async fn add_session(&self, id: SessionId) {
        self.state.write().await.sessions.insert(id);
    }

    /// Issues `token` to an already registered user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidReference`] if the user is unknown.
    pub async fn add_token(&self, token: &str, user_id: UserId) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(GatewayError::InvalidReference {
                kind: ReferenceKind::User,
                id: user_id.get(),
            });
        }
        state.tokens.insert(token.to_string(), user_id);
        Ok(())
    }

    /// Registers user 1 as a POS operator holding `token`, with session 1
    /// open.
    ///
    /// # Errors
    ///
    /// Propagates [`MemoryStore::add_token`] failures.
    pub async fn seed_demo_operator(&self, token: &str) -> Result<(), GatewayError> {
        let user_id = UserId::new(1);
        self.add_user(user_id, "demo", true).await;
        self.add_session(SessionId::new(1)).await;
        self.add_token(token, user_id).await
    }

    /// Returns every stored entry in ascending timestamp order.
    pub async fn all_entries(&self) -> Vec<OfflineLogEntry> {
        let state = self.state.read().await;
        let mut entries = state.logs.clone();
        entries.sort_by_key(|e| (e.timestamp, e.id));
        entries
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.logs.len()
    }

    /// Returns `true` if no entry has been stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.logs.is_empty()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn insert_batch(&self, batch: TrustedBatch) -> Result<Vec<i64>, GatewayError> {
        let mut state = self.state.write().await;

        for entry in batch.entries() {
            if !state.sessions.contains(&entry.session_id) {
                return Err(GatewayError::InvalidReference {
                    kind: ReferenceKind::Session,
                    id: entry.session_id.get(),
                });
            }
            if !state.users.contains_key(&entry.user_id) {
                return Err(GatewayError::InvalidReference {
                    kind: ReferenceKind::User,
                    id: entry.user_id.get(),
                });
            }
        }

        let mut ids = Vec::with_capacity(batch.len());
        for entry in batch.into_entries() {
            state.next_id = state.next_id.saturating_add(1);
            let id = state.next_id;
            state.logs.push(OfflineLogEntry {
                id,
                session_id: entry.session_id,
                user_id: entry.user_id,
                timestamp: entry.timestamp.unwrap_or_else(storage_now),
                event_type: entry.event_type,
                details: entry.details,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn list(&self, query: &LogQuery) -> Result<LogPage, GatewayError> {
        let state = self.state.read().await;
        let mut matching: Vec<&OfflineLogEntry> =
            state.logs.iter().filter(|e| query.matches(e)).collect();
        matching.sort_by_key(|e| (e.timestamp, e.id));

        let total = matching.len() as u64;
        let entries = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(LogPage { entries, total })
    }
}

#[async_trait]
impl IdentityDirectory for MemoryStore {
    async fn resolve_token(&self, token: &str) -> Result<Option<Caller>, GatewayError> {
        let state = self.state.read().await;
        let caller = state.tokens.get(token).and_then(|user_id| {
            state.users.get(user_id).map(|user| Caller {
                user_id: *user_id,
                login: user.login.clone(),
                is_pos_operator: user.is_pos_operator,
            })
        });
        Ok(caller)
    }
}
