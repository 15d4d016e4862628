mod common;

use axum::http::{Method, StatusCode};
use common::{as_decimal, body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use stocktrack_api::entities::inventory_movement::{MovementDirection, MovementReason};
use stocktrack_api::services::movements::NewMovement;

async fn append(
    app: &TestApp,
    product_id: i64,
    warehouse_id: i64,
    direction: MovementDirection,
    quantity: rust_decimal::Decimal,
) {
    app.state
        .services
        .ledger
        .append(
            &*app.state.db,
            NewMovement {
                product_id,
                warehouse_id,
                direction,
                reason: MovementReason::Adjustment,
                quantity,
                unit_cost: None,
                purchase_order_line_id: None,
                operator_id: None,
                reference: None,
                notes: None,
            },
        )
        .await
        .expect("append movement for test");
}

#[tokio::test]
async fn balances_are_signed_sums_per_product_and_warehouse() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("SKU-A").await;
    let product_b = app.seed_product("SKU-B").await;
    let wh1 = app.seed_warehouse("WH-1").await;
    let wh2 = app.seed_warehouse("WH-2").await;

    append(&app, product_a.id, wh1.id, MovementDirection::In, dec!(10)).await;
    append(&app, product_a.id, wh1.id, MovementDirection::Out, dec!(3)).await;
    append(&app, product_a.id, wh2.id, MovementDirection::In, dec!(5)).await;
    append(&app, product_b.id, wh1.id, MovementDirection::In, dec!(2)).await;

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stock = body_json(response).await;
    let rows = stock.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    // sorted by product name, then warehouse code
    assert_eq!(rows[0]["product_sku"], "SKU-A");
    assert_eq!(rows[0]["warehouse_code"], "WH-1");
    assert_eq!(as_decimal(&rows[0]["on_hand"]), dec!(7));
    assert_eq!(rows[1]["product_sku"], "SKU-A");
    assert_eq!(rows[1]["warehouse_code"], "WH-2");
    assert_eq!(as_decimal(&rows[1]["on_hand"]), dec!(5));
    assert_eq!(rows[2]["product_sku"], "SKU-B");
    assert_eq!(as_decimal(&rows[2]["on_hand"]), dec!(2));
}

#[tokio::test]
async fn stock_report_supports_filters() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("SKU-A").await;
    let product_b = app.seed_product("SKU-B").await;
    let wh1 = app.seed_warehouse("WH-1").await;
    let wh2 = app.seed_warehouse("WH-2").await;

    append(&app, product_a.id, wh1.id, MovementDirection::In, dec!(1)).await;
    append(&app, product_a.id, wh2.id, MovementDirection::In, dec!(2)).await;
    append(&app, product_b.id, wh1.id, MovementDirection::In, dec!(3)).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/stock?product_id={}", product_a.id),
            None,
        )
        .await;
    let stock = body_json(response).await;
    assert_eq!(stock.as_array().unwrap().len(), 2);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/stock?product_id={}&warehouse_id={}", product_a.id, wh2.id),
            None,
        )
        .await;
    let stock = body_json(response).await;
    let rows = stock.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(as_decimal(&rows[0]["on_hand"]), dec!(2));
}

#[tokio::test]
async fn pairs_without_movements_are_absent_and_zero_balances_remain() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-A").await;
    let _unused_product = app.seed_product("SKU-Z").await;
    let warehouse = app.seed_warehouse("WH-1").await;

    append(&app, product.id, warehouse.id, MovementDirection::In, dec!(4)).await;
    append(&app, product.id, warehouse.id, MovementDirection::Out, dec!(4)).await;

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    let stock = body_json(response).await;
    let rows = stock.as_array().unwrap();

    // the fully offset pair still shows with a zero balance, the product with
    // no movements does not show at all
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_sku"], "SKU-A");
    assert_eq!(as_decimal(&rows[0]["on_hand"]), dec!(0));
}

#[tokio::test]
async fn negative_balances_pass_through_unclamped() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-A").await;
    let warehouse = app.seed_warehouse("WH-1").await;

    // raw ledger appends bypass the outbound availability guard, e.g. from
    // historical imports
    append(&app, product.id, warehouse.id, MovementDirection::Out, dec!(3)).await;

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    let stock = body_json(response).await;
    assert_eq!(as_decimal(&stock[0]["on_hand"]), dec!(-3));
}

#[tokio::test]
async fn report_totals_match_receipts_minus_issues() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-A").await;
    let warehouse = app.seed_warehouse("WH-1").await;
    let supplier = app.seed_supplier("TAX-9").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "order_number": "PO-AGG-1",
                "supplier_id": supplier.id,
                "lines": [{ "product_id": product.id, "quantity_ordered": "20", "unit_cost": "2.00" }],
            })),
        )
        .await;
    let order = body_json(response).await;
    let order_id = order["id"].as_i64().unwrap();
    let line_id = order["lines"][0]["id"].as_i64().unwrap();

    app.request(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/receive", order_id),
        Some(json!({
            "warehouse_id": warehouse.id,
            "lines": [{ "line_id": line_id, "quantity": "20" }],
        })),
    )
    .await;

    for _ in 0..3 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/movements/outbound",
                Some(json!({
                    "product_id": product.id,
                    "warehouse_id": warehouse.id,
                    "quantity": "4",
                    "reason": 2,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    let stock = body_json(response).await;
    assert_eq!(as_decimal(&stock[0]["on_hand"]), dec!(8));
}
