use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState, services::stock::StockFilter};
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockQueryParams {
    pub product_id: Option<i64>,
    pub warehouse_id: Option<i64>,
}

/// Current stock per product and warehouse
#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockQueryParams),
    responses(
        (status = 200, description = "Stock balances", body = [crate::services::stock::StockBalance])
    ),
    tag = "stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Query(params): Query<StockQueryParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let balances = state
        .services
        .stock
        .current_stock(StockFilter {
            product_id: params.product_id,
            warehouse_id: params.warehouse_id,
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(balances))
}

/// Creates the router for stock endpoints
pub fn stock_routes() -> Router<AppState> {
    Router::new().route("/", get(get_stock))
}
