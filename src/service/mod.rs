//! Service layer: business logic orchestration.
//!
//! [`OfflineLogService`] gates callers, normalizes submitted batches via
//! [`ingestion`], and writes through the [`crate::persistence::LogStore`].

pub mod ingestion;
pub mod log_service;

pub use log_service::OfflineLogService;
