//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod offline_log_dto;

pub use common_dto::*;
pub use offline_log_dto::*;
