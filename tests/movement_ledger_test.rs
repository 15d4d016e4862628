mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use stocktrack_api::entities::inventory_movement::{MovementDirection, MovementReason};
use stocktrack_api::services::movements::NewMovement;

async fn append_as(app: &TestApp, product_id: i64, warehouse_id: i64, operator: Option<&str>) {
    app.state
        .services
        .ledger
        .append(
            &*app.state.db,
            NewMovement {
                product_id,
                warehouse_id,
                direction: MovementDirection::In,
                reason: MovementReason::Adjustment,
                quantity: dec!(1),
                unit_cost: None,
                purchase_order_line_id: None,
                operator_id: operator.map(|s| s.to_string()),
                reference: None,
                notes: None,
            },
        )
        .await
        .expect("append movement for test");
}

#[tokio::test]
async fn list_filters_by_operator_and_direction() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-L1").await;
    let warehouse = app.seed_warehouse("WH-L").await;

    append_as(&app, product.id, warehouse.id, Some("alice")).await;
    append_as(&app, product.id, warehouse.id, Some("bob")).await;
    append_as(&app, product.id, warehouse.id, None).await;

    let response = app
        .request(Method::GET, "/api/v1/movements?operator_id=alice", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 1);
    assert_eq!(movements["data"][0]["operator_id"], "alice");

    let response = app
        .request(Method::GET, "/api/v1/movements?direction=IN", None)
        .await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 3);

    let response = app
        .request(Method::GET, "/api/v1/movements?direction=OUT", None)
        .await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 0);
}

#[tokio::test]
async fn list_is_paginated_newest_first() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-L2").await;
    let warehouse = app.seed_warehouse("WH-L").await;

    for _ in 0..5 {
        append_as(&app, product.id, warehouse.id, None).await;
    }

    let response = app
        .request(Method::GET, "/api/v1/movements?page=1&per_page=2", None)
        .await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 5);
    assert_eq!(movements["pagination"]["total_pages"], 3);
    assert_eq!(movements["data"].as_array().unwrap().len(), 2);

    // newest first: the first page starts with the highest id
    let first_id = movements["data"][0]["id"].as_i64().unwrap();
    let second_id = movements["data"][1]["id"].as_i64().unwrap();
    assert!(first_id > second_id);
}

#[tokio::test]
async fn clearing_an_operator_keeps_the_movements() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-L3").await;
    let warehouse = app.seed_warehouse("WH-L").await;

    append_as(&app, product.id, warehouse.id, Some("carol")).await;
    append_as(&app, product.id, warehouse.id, Some("carol")).await;
    append_as(&app, product.id, warehouse.id, Some("dave")).await;

    let response = app
        .request(Method::DELETE, "/api/v1/movements/operators/carol", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["movements_cleared"], 2);

    // ledger rows survive, only the identity link is gone
    let response = app.request(Method::GET, "/api/v1/movements", None).await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 3);

    let response = app
        .request(Method::GET, "/api/v1/movements?operator_id=carol", None)
        .await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 0);

    // other operators are untouched
    let response = app
        .request(Method::GET, "/api/v1/movements?operator_id=dave", None)
        .await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 1);
}

#[tokio::test]
async fn clearing_an_unknown_operator_clears_nothing() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::DELETE, "/api/v1/movements/operators/nobody", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["movements_cleared"], 0);
}

#[tokio::test]
async fn movement_flow_records_outbound_after_receipt() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-L4").await;
    let warehouse = app.seed_warehouse("WH-L").await;
    let supplier = app.seed_supplier("TAX-L").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "order_number": "PO-L-1",
                "supplier_id": supplier.id,
                "lines": [{ "product_id": product.id, "quantity_ordered": "6", "unit_cost": "1.50" }],
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
            "lines": [{ "line_id": line_id, "quantity": "6" }],
        })),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/movements/outbound",
            Some(json!({
                "product_id": product.id,
                "warehouse_id": warehouse.id,
                "quantity": "2",
                "reason": 2,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::GET, "/api/v1/movements?direction=OUT", None)
        .await;
    let movements = body_json(response).await;
    assert_eq!(movements["pagination"]["total"], 1);
    assert_eq!(movements["data"][0]["reason"], "Sale");
}
