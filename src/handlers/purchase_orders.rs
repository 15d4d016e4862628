use super::common::{
    created_response, map_service_error, no_content_response, operator_id, success_response,
    validate_input, PaginatedResponse, PaginationParams,
};
use crate::{
    entities::purchase_order::PurchaseOrderStatus,
    errors::ApiError,
    handlers::AppState,
    services::{
        purchase_orders::{NewOrderLine, NewPurchaseOrder},
        receiving::ReceiveLine,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1, max = 30))]
    pub order_number: String,
    pub supplier_id: i64,
    pub expected_date: Option<DateTime<Utc>>,
    #[validate(length(min = 3, max = 3))]
    pub currency: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub lines: Vec<PurchaseOrderLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderLineRequest {
    pub product_id: i64,
    #[schema(value_type = String, example = "10.00")]
    pub quantity_ordered: Decimal,
    #[schema(value_type = String, example = "4.50")]
    pub unit_cost: Decimal,
    #[schema(value_type = Option<String>)]
    pub tax_pct: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub discount_pct: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceivePurchaseOrderRequest {
    /// Warehouse the goods arrive into. Required.
    pub warehouse_id: Option<i64>,
    pub lines: Vec<ReceiveLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiveLineRequest {
    pub line_id: i64,
    #[schema(value_type = String, example = "5.00")]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListPurchaseOrdersParams {
    /// Numeric order status to filter by
    pub status: Option<i16>,
}

// Handler functions

/// Create a new purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier or product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order number already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let lines = payload
        .lines
        .into_iter()
        .map(|line| NewOrderLine {
            product_id: line.product_id,
            quantity_ordered: line.quantity_ordered,
            unit_cost: line.unit_cost,
            tax_pct: line.tax_pct,
            discount_pct: line.discount_pct,
        })
        .collect();

    let created = state
        .services
        .purchase_orders
        .create(NewPurchaseOrder {
            order_number: payload.order_number,
            supplier_id: payload.supplier_id,
            expected_date: payload.expected_date,
            currency: payload.currency,
            notes: payload.notes,
            lines,
        })
        .await
        .map_err(map_service_error)?;

    info!("Purchase order created: {}", created.order.order_number);

    Ok(created_response(created))
}

/// Get a purchase order with its lines
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i64, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order fetched"),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .get(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number, 1-based"),
        ("per_page" = Option<u64>, Query, description = "Page size"),
        ("status" = Option<i16>, Query, description = "Numeric order status filter")
    ),
    responses((status = 200, description = "Purchase orders listed")),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<ListPurchaseOrdersParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let status = params
        .status
        .map(|s| {
            PurchaseOrderStatus::try_from_value(&s)
                .map_err(|_| ApiError::ValidationError(format!("Unknown order status {}", s)))
        })
        .transpose()?;

    let (orders, total) = state
        .services
        .purchase_orders
        .list(status, pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        orders,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Issue a draft purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/issue",
    params(("id" = i64, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order issued"),
        (status = 400, description = "Order is not in draft", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn issue_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .issue(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Cancel a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    params(("id" = i64, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order cancelled"),
        (status = 400, description = "Order is already terminal", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .cancel(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Receive goods against a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    request_body = ReceivePurchaseOrderRequest,
    params(("id" = i64, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Receipt applied"),
        (status = 400, description = "Invalid receipt", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent receipt, retry", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ReceivePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let warehouse_id = payload.warehouse_id.ok_or_else(|| {
        ApiError::ValidationError("A receiving warehouse is required".to_string())
    })?;

    let lines = payload
        .lines
        .into_iter()
        .map(|line| ReceiveLine {
            line_id: line.line_id,
            quantity: line.quantity,
        })
        .collect();

    let summary = state
        .services
        .receiving
        .receive(order_id, warehouse_id, lines, operator_id(&headers))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Delete a purchase order without ledger history
#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i64, Path, description = "Purchase order ID")),
    responses(
        (status = 204, description = "Purchase order deleted"),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order has linked inventory movements", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .purchase_orders
        .delete(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Remove a line from a purchase order
#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}/lines/{line_id}",
    params(
        ("id" = i64, Path, description = "Purchase order ID"),
        ("line_id" = i64, Path, description = "Line ID")
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Line not found on this order", body = crate::errors::ErrorResponse),
        (status = 409, description = "Line has linked inventory movements", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn remove_purchase_order_line(
    State(state): State<AppState>,
    Path((order_id, line_id)): Path<(i64, i64)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .purchase_orders
        .remove_line(order_id, line_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Creates the router for purchase order endpoints
pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_order))
        .route("/", get(list_purchase_orders))
        .route("/:id", get(get_purchase_order))
        .route("/:id", delete(delete_purchase_order))
        .route("/:id/issue", post(issue_purchase_order))
        .route("/:id/cancel", post(cancel_purchase_order))
        .route("/:id/receive", post(receive_purchase_order))
        .route("/:id/lines/:line_id", delete(remove_purchase_order_line))
}
