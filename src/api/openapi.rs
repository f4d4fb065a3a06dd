//! OpenAPI document for the gateway.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    CreateLogEntriesRequest, CreateLogEntriesResponse, EventTypeInfo, LogListResponse,
    PaginationMeta,
};
use super::handlers::{offline_log, service_worker, system};
use crate::domain::{OfflineEventType, OfflineLogEntry, SessionId, UserId};
use crate::error::{ErrorBody, ErrorResponse};

/// Registers the bearer token scheme used by the offline log endpoints.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// Generated API documentation.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        offline_log::create_log_entries,
        offline_log::list_log_entries,
        service_worker::service_worker_handler,
        system::health_handler,
        system::event_types_handler,
    ),
    components(schemas(
        CreateLogEntriesRequest,
        CreateLogEntriesResponse,
        LogListResponse,
        PaginationMeta,
        EventTypeInfo,
        OfflineLogEntry,
        OfflineEventType,
        SessionId,
        UserId,
        ErrorResponse,
        ErrorBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Offline logs", description = "Events recorded by POS terminals while offline"),
        (name = "Static", description = "Assets served with special headers"),
        (name = "System", description = "Health and catalog endpoints"),
    )
)]
pub struct ApiDoc;
