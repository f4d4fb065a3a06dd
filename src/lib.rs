//! # pos-offline-gateway
//!
//! Backend companion for point-of-sale front ends that keep selling while
//! the network is down.
//!
//! Terminals buffer connectivity changes and offline close attempts, then
//! flush them to this service in batches. The gateway checks that the
//! caller is a POS operator, drops malformed records one by one, and stores
//! the rest atomically. It also serves the POS service worker with the
//! header that lets it control the whole origin.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Bearer auth (api/auth)
//!     │
//!     ├── OfflineLogService (service/)
//!     ├── Batch normalization (service/ingestion)
//!     │
//!     └── LogStore / IdentityDirectory (persistence/)
//!             ├── PostgreSQL
//!             └── In-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
