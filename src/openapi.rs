use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StockTrack API",
        version = "1.0.0",
        description = r#"
Inventory core service built around an append-only movement ledger.

Stock on hand is never stored; it is always derived by reducing the
movement ledger per product and warehouse. Purchase order receiving and
manual outbound issues are the two write paths into the ledger.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "purchase-orders", description = "Purchase order lifecycle and receiving"),
        (name = "movements", description = "Inventory movement ledger"),
        (name = "stock", description = "Derived stock balances")
    ),
    paths(
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::issue_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,
        crate::handlers::purchase_orders::receive_purchase_order,
        crate::handlers::purchase_orders::delete_purchase_order,
        crate::handlers::purchase_orders::remove_purchase_order_line,
        crate::handlers::movements::issue_outbound,
        crate::handlers::movements::list_movements,
        crate::handlers::movements::clear_operator,
        crate::handlers::stock::get_stock,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::purchase_orders::CreatePurchaseOrderRequest,
        crate::handlers::purchase_orders::PurchaseOrderLineRequest,
        crate::handlers::purchase_orders::ReceivePurchaseOrderRequest,
        crate::handlers::purchase_orders::ReceiveLineRequest,
        crate::handlers::movements::OutboundIssueRequest,
        crate::services::stock::StockBalance,
    ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the OpenAPI document
pub fn openapi_routes() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}
