#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use scm_hub::{config::AppConfig, db, events, AppState};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration_signing_secret_for_scm_hub_tests";

/// Application wired against a private in-memory SQLite database.
/// The first registered account is the admin used by the helpers.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let event_sender = Arc::new(events::EventSender::new(event_tx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = scm_hub::app_router(state.clone());

        let mut app = Self {
            router,
            state,
            admin_token: String::new(),
            _event_task: event_task,
        };
        app.admin_token = app
            .register_user("Plant Admin", "admin@scm.test", "admin-password")
            .await;
        app
    }

    pub fn token(&self) -> &str {
        &self.admin_token
    }

    /// Registers an account and returns its bearer token
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/register",
                Some(json!({ "name": name, "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"]["access_token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
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

    /// Sends a request and parses the JSON body (Null when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(self.token())).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), Some(self.token()))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body), Some(self.token()))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, Some(self.token()))
            .await
    }

    /// POSTs and asserts 201, returning `data`
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, response) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {response}");
        response["data"].clone()
    }

    pub async fn seed_process(&self, name: &str) -> Uuid {
        let data = self
            .create("/api/v1/processes", json!({ "name": name }))
            .await;
        id_of(&data)
    }

    pub async fn seed_customer(&self, name: &str) -> Uuid {
        let data = self
            .create(
                "/api/v1/customers",
                json!({
                    "name": name,
                    "email": format!("{}@customer.test", name.to_lowercase().replace(' ', ".")),
                    "billing_address": "12 Foundry Road, Pune",
                    "country": "India",
                    "currency": "inr",
                    "credit_period": 45
                }),
            )
            .await;
        id_of(&data)
    }

    /// Supplier with optional `(process, price)` pricing
    pub async fn seed_supplier(&self, name: &str, pricing: &[(Uuid, &str)]) -> Uuid {
        let pricing: Vec<Value> = pricing
            .iter()
            .map(|(process_id, price)| json!({ "process_id": process_id, "price": price }))
            .collect();
        let data = self
            .create(
                "/api/v1/suppliers",
                json!({
                    "name": name,
                    "email": format!("{}@supplier.test", name.to_lowercase().replace(' ', ".")),
                    "address": "Plot 7, MIDC Chakan",
                    "credit_period": 30,
                    "process_pricing": pricing
                }),
            )
            .await;
        id_of(&data)
    }

    pub async fn seed_part(&self, seed: PartSeed<'_>) -> Uuid {
        let data = self
            .create(
                "/api/v1/parts",
                json!({
                    "drawing_number": seed.drawing_number,
                    "name": format!("Part {}", seed.drawing_number),
                    "revision": "A",
                    "customer_id": seed.customer_id,
                    "primary_supplier_id": seed.supplier_id,
                    "cost_price": seed.cost_price,
                    "selling_price": seed.selling_price,
                    "stock": seed.stock,
                    "is_job_work": !seed.processes.is_empty(),
                    "required_processes": seed.processes,
                    "manufacturing_condition": "Machined"
                }),
            )
            .await;
        id_of(&data)
    }

    pub async fn seed_sales_order(&self, customer_id: Uuid, lines: &[(Uuid, i32)]) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|(part_id, quantity)| json!({ "part_id": part_id, "quantity": quantity }))
            .collect();
        self.create(
            "/api/v1/sales-orders",
            json!({ "customer_id": customer_id, "customer_po_number": "CUST-PO-77", "items": items }),
        )
        .await
    }

    pub async fn part_stock(&self, part_id: Uuid) -> i64 {
        let (status, body) = self.get(&format!("/api/v1/parts/{part_id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["stock"].as_i64().expect("stock is a number")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub struct PartSeed<'a> {
    pub drawing_number: &'a str,
    pub customer_id: Uuid,
    pub supplier_id: Uuid,
    pub cost_price: &'a str,
    pub selling_price: &'a str,
    pub stock: i32,
    pub processes: Vec<Uuid>,
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse response body")
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no id in {value}"))
}

/// Decimals serialize as strings
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
