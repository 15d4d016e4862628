use super::common::{
    created_response, map_service_error, operator_id, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    entities::inventory_movement::{MovementDirection, MovementReason},
    errors::ApiError,
    handlers::AppState,
    services::{movements::MovementFilter, outbound::OutboundRequest},
};
use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

// Request DTOs

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OutboundIssueRequest {
    pub product_id: i64,
    pub warehouse_id: i64,
    #[schema(value_type = String, example = "3.00")]
    pub quantity: Decimal,
    /// Numeric movement reason; only sale (2) and consumption (3) are
    /// accepted for manual issues.
    pub reason: i16,
    #[schema(max_length = 60)]
    pub reference: Option<String>,
    #[schema(max_length = 400)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListMovementsParams {
    pub product_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub operator_id: Option<String>,
    pub direction: Option<MovementDirection>,
}

// Handler functions

/// Issue stock out of a warehouse
#[utoipa::path(
    post,
    path = "/api/v1/movements/outbound",
    request_body = OutboundIssueRequest,
    responses(
        (status = 201, description = "Outbound movement recorded"),
        (status = 400, description = "Invalid quantity or reason", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or warehouse not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent issue, retry", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn issue_outbound(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OutboundIssueRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let reason = MovementReason::try_from_value(&payload.reason)
        .map_err(|_| ApiError::ValidationError(format!("Unknown movement reason {}", payload.reason)))?;

    let movement = state
        .services
        .outbound
        .issue(
            OutboundRequest {
                product_id: payload.product_id,
                warehouse_id: payload.warehouse_id,
                quantity: payload.quantity,
                reason,
                reference: payload.reference,
                notes: payload.notes,
            },
            operator_id(&headers),
        )
        .await
        .map_err(map_service_error)?;

    info!(
        "Outbound movement {} recorded for product {}",
        movement.id, movement.product_id
    );

    Ok(created_response(movement))
}

/// List ledger movements
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(
        ("page" = Option<u64>, Query, description = "Page number, 1-based"),
        ("per_page" = Option<u64>, Query, description = "Page size"),
        ("product_id" = Option<i64>, Query, description = "Filter by product"),
        ("warehouse_id" = Option<i64>, Query, description = "Filter by warehouse"),
        ("operator_id" = Option<String>, Query, description = "Filter by operator"),
        ("direction" = Option<String>, Query, description = "IN or OUT")
    ),
    responses((status = 200, description = "Movements listed")),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<ListMovementsParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (movements, total) = state
        .services
        .ledger
        .list(
            MovementFilter {
                product_id: params.product_id,
                warehouse_id: params.warehouse_id,
                operator_id: params.operator_id,
                direction: params.direction,
            },
            pagination.page,
            pagination.per_page,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        movements,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Detach an operator identity from the ledger
#[utoipa::path(
    delete,
    path = "/api/v1/movements/operators/{operator_id}",
    params(("operator_id" = String, Path, description = "Operator identity to clear")),
    responses((status = 200, description = "Operator cleared from movements")),
    tag = "movements"
)]
pub async fn clear_operator(
    State(state): State<AppState>,
    Path(op): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cleared = state
        .services
        .ledger
        .clear_operator(&op)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "operator_id": op,
        "movements_cleared": cleared
    })))
}

/// Creates the router for movement endpoints
pub fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movements))
        .route("/outbound", post(issue_outbound))
        .route("/operators/:operator_id", delete(clear_operator))
}
