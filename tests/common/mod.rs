use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use stocktrack_api::{
    config::AppConfig,
    db,
    entities::{product, supplier, warehouse},
    events::{self, EventSender},
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness for spinning up an application backed by a file SQLite
/// database in a temp directory. The pool is limited to one connection so
/// concurrent transactions serialize deterministically.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = tmp.path().join("stocktrack_test.db");

        let mut cfg = AppConfig::new(
            &format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1",
            0,
            "test",
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = stocktrack_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    /// Send a JSON request carrying an operator identity header.
    pub async fn request_as_operator(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        operator: &str,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[("x-operator-id", operator)])
            .await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, sku: &str) -> product::Model {
        self.seed_product_with_active(sku, true).await
    }

    pub async fn seed_product_with_active(&self, sku: &str, active: bool) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            sku: Set(sku.to_string()),
            name: Set(format!("Product {}", sku)),
            unit_of_measure: Set("EA".to_string()),
            standard_cost: Set(Decimal::new(100, 2)),
            suggested_price: Set(Decimal::new(150, 2)),
            barcode: Set(None),
            active: Set(active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product for tests")
    }

    pub async fn seed_warehouse(&self, code: &str) -> warehouse::Model {
        self.seed_warehouse_with_active(code, true).await
    }

    pub async fn seed_warehouse_with_active(&self, code: &str, active: bool) -> warehouse::Model {
        let now = Utc::now();
        warehouse::ActiveModel {
            code: Set(code.to_string()),
            name: Set(format!("Warehouse {}", code)),
            address: Set(None),
            active: Set(active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed warehouse for tests")
    }

    pub async fn seed_supplier(&self, tax_id: &str) -> supplier::Model {
        let now = Utc::now();
        supplier::ActiveModel {
            name: Set(format!("Supplier {}", tax_id)),
            tax_id: Set(tax_id.to_string()),
            email: Set(None),
            lead_time_days: Set(7),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed supplier for tests")
    }
}

/// Reads a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is not valid json")
}

/// Parses a JSON value holding a decimal, whether encoded as string or number.
pub fn as_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected decimal, got {:?}", other),
    }
}
