//! Offline log handlers: batch ingestion and listing.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthenticatedCaller;
use crate::api::dto::{
    CreateLogEntriesRequest, CreateLogEntriesResponse, LogListParams, LogListResponse,
    PaginationMeta, clamp_page,
};
use crate::app_state::AppState;
use crate::domain::{SessionId, UserId};
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::LogQuery;

/// `POST /offline-logs/batch` — Record events buffered while offline.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller is not authenticated or the
/// accepted entries could not be stored.
#[utoipa::path(
    post,
    path = "/api/v1/offline-logs/batch",
    tag = "Offline logs",
    summary = "Record offline events",
    description = "Validates each record independently, skips malformed ones, and stores the rest atomically. Returns `result: false` when the caller lacks the POS operator capability.",
    request_body = CreateLogEntriesRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Batch processed", body = CreateLogEntriesResponse),
        (status = 400, description = "Body is not a JSON object with a `logs` array", body = ErrorResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 422, description = "Entry references an unknown session or user", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn create_log_entries(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<CreateLogEntriesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let result = state
        .log_service
        .create_multiple_log_entries(&caller, &req.logs)
        .await?;
    Ok(Json(CreateLogEntriesResponse { result }))
}

/// `GET /offline-logs` — Browse recorded events.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller is not authenticated, lacks
/// the POS operator capability, or the store fails.
#[utoipa::path(
    get,
    path = "/api/v1/offline-logs",
    tag = "Offline logs",
    summary = "List offline events",
    description = "Returns recorded events in ascending timestamp order, optionally filtered by session, user, and event type.",
    params(LogListParams),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Paginated event list", body = LogListResponse),
        (status = 400, description = "Malformed query parameters", body = ErrorResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 403, description = "Caller is not a POS operator", body = ErrorResponse),
    )
)]
pub async fn list_log_entries(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    params: Result<Query<LogListParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(params) = params?;
    let (page, per_page) = clamp_page(params.page, params.per_page);
    let query = LogQuery {
        session_id: params.session_id.map(SessionId::new),
        user_id: params.user_id.map(UserId::new),
        event_type: params.event_type,
        offset: (page - 1).saturating_mul(per_page),
        limit: per_page,
    };

    let result = state.log_service.list_entries(&caller, &query).await?;

    Ok(Json(LogListResponse {
        data: result.entries,
        pagination: PaginationMeta::new(page, per_page, result.total),
    }))
}

/// Offline log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/offline-logs", get(list_log_entries))
        .route("/offline-logs/batch", post(create_log_entries))
}
