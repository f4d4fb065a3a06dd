//! Offline log service: capability gate, normalization, and storage.

use std::sync::Arc;

use serde_json::Value;

use super::ingestion::{TrustedBatch, authorize, normalize_batch};
use crate::domain::Caller;
use crate::error::GatewayError;
use crate::persistence::{LogPage, LogQuery, LogStore};

/// Orchestration layer for offline log operations.
///
/// Stateless coordinator over a [`LogStore`]. Ingestion follows the
/// pattern: gate on capability → normalize → insert the accepted entries
/// as one trusted batch → report.
#[derive(Debug, Clone)]
pub struct OfflineLogService {
    store: Arc<dyn LogStore>,
}

impl OfflineLogService {
    /// Creates a new `OfflineLogService`.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Returns a reference to the inner [`LogStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.store
    }

    /// Records a batch of raw client events on behalf of `caller`.
    ///
    /// Returns `false` without inspecting the batch when the caller is not
    /// a POS operator. Malformed records are logged and skipped; a batch
    /// with nothing valid left is still a success.
    ///
    /// # Errors
    ///
    /// Returns the store's [`GatewayError`] if the accepted entries could
    /// not be written. Nothing from the call is stored in that case.
    pub async fn create_multiple_log_entries(
        &self,
        caller: &Caller,
        logs: &[Value],
    ) -> Result<bool, GatewayError> {
        let Some(grant) = authorize(caller) else {
            tracing::warn!(
                user_id = %caller.user_id,
                login = %caller.login,
                "offline log sync attempted without POS permissions"
            );
            return Ok(false);
        };

        let normalized = normalize_batch(logs);
        for discard in &normalized.discarded {
            if discard.is_timestamp_error() {
                tracing::error!(
                    index = discard.index,
                    reason = %discard.reason,
                    payload = %discard.payload,
                    "invalid timestamp in offline log entry, skipped"
                );
            } else {
                tracing::warn!(
                    index = discard.index,
                    reason = %discard.reason,
                    payload = %discard.payload,
                    "incomplete offline log entry skipped"
                );
            }
        }

        if normalized.accepted.is_empty() {
            tracing::info!(
                received = logs.len(),
                "no valid offline log entries received"
            );
            return Ok(true);
        }

        let batch = TrustedBatch::new(&grant, normalized.accepted);
        let count = batch.len();
        match self.store.insert_batch(batch).await {
            Ok(ids) => {
                tracing::info!(
                    created = ids.len(),
                    discarded = normalized.discarded.len(),
                    user_id = %grant.user_id(),
                    "offline log sync succeeded"
                );
                Ok(true)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    entries = count,
                    user_id = %grant.user_id(),
                    "failed to store offline log entries; check session and user ids"
                );
                Err(err)
            }
        }
    }

    /// Lists stored entries for a back-office caller.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] if the caller is not a POS
    /// operator, or the store's error on read failure.
    pub async fn list_entries(
        &self,
        caller: &Caller,
        query: &LogQuery,
    ) -> Result<LogPage, GatewayError> {
        if authorize(caller).is_none() {
            return Err(GatewayError::Forbidden(
                "POS operator capability required".to_string(),
            ));
        }
        self.store.list(query).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::timestamp::format_storage;
    use crate::domain::{OfflineEventType, SessionId, UserId};
    use crate::persistence::MemoryStore;

    fn caller(is_pos_operator: bool) -> Caller {
        Caller {
            user_id: UserId::new(5),
            login: "cashier".to_string(),
            is_pos_operator,
        }
    }

    async fn make_service() -> (OfflineLogService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.add_user(UserId::new(5), "cashier", true).await;
        store.add_session(SessionId::new(1)).await;
        let dyn_store: Arc<dyn LogStore> = Arc::clone(&store) as Arc<dyn LogStore>;
        (OfflineLogService::new(dyn_store), store)
    }

    #[tokio::test]
    async fn stores_valid_and_skips_invalid() {
        let (service, store) = make_service().await;
        let logs = vec![
            json!({
                "session": 1,
                "user": 5,
                "eventType": "network_lost",
                "timestamp": "2024-01-01T10:00:00.000Z",
            }),
            json!({"session": 1, "user": 5, "eventType": "bad"}),
        ];

        let result = service.create_multiple_log_entries(&caller(true), &logs).await;
        assert!(matches!(result, Ok(true)));

        let entries = store.all_entries().await;
        assert_eq!(entries.len(), 1);
        let Some(entry) = entries.first() else {
            panic!("nothing stored");
        };
        assert_eq!(format_storage(&entry.timestamp), "2024-01-01 10:00:00");
        assert_eq!(entry.event_type, OfflineEventType::NetworkLost);
    }

    #[tokio::test]
    async fn unauthorized_caller_gets_false() {
        let (service, store) = make_service().await;
        let logs = vec![json!({"session_id": 1, "user_id": 5, "event_type": "network_lost"})];

        let result = service.create_multiple_log_entries(&caller(false), &logs).await;
        assert!(matches!(result, Ok(false)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn all_malformed_is_success() {
        let (service, store) = make_service().await;
        let logs = vec![
            json!({"user_id": 5, "event_type": "network_lost"}),
            json!({
                "session_id": 1,
                "user_id": 5,
                "event_type": "network_lost",
                "timestamp": "yesterday",
            }),
        ];

        let result = service.create_multiple_log_entries(&caller(true), &logs).await;
        assert!(matches!(result, Ok(true)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn empty_batch_is_success() {
        let (service, _) = make_service().await;
        let result = service.create_multiple_log_entries(&caller(true), &[]).await;
        assert!(matches!(result, Ok(true)));
    }

    #[tokio::test]
    async fn dangling_reference_propagates_and_rolls_back() {
        let (service, store) = make_service().await;
        let logs = vec![
            json!({"session_id": 1, "user_id": 5, "event_type": "network_lost"}),
            json!({"session_id": 42, "user_id": 5, "event_type": "network_recovered"}),
        ];

        let result = service.create_multiple_log_entries(&caller(true), &logs).await;
        assert!(matches!(
            result,
            Err(GatewayError::InvalidReference { id: 42, .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn listing_requires_operator() {
        let (service, _) = make_service().await;
        let query = LogQuery {
            limit: 20,
            ..LogQuery::default()
        };
        let result = service.list_entries(&caller(false), &query).await;
        assert!(matches!(result, Err(GatewayError::Forbidden(_))));

        let result = service.list_entries(&caller(true), &query).await;
        tokio_test::assert_ok!(result);
    }
}
