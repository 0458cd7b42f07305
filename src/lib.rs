//! SCM Hub library
//!
//! Supply-chain backend for a contract manufacturer: master data, sales and
//! purchase orders, goods receipt, invoicing and multi-stage job work.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires every service over one pool and event channel
    pub fn new(
        db: Arc<db::DbPool>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }

    pub fn auth_service(&self) -> Arc<AuthService> {
        self.services.auth.clone()
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_carries_message_without_data() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
    }

    #[test]
    fn validation_errors_response_lists_each_error() {
        let response = ApiResponse::<()>::validation_errors(vec!["missing".into()]);
        assert_eq!(response.errors, Some(vec!["missing".to_string()]));
        assert_eq!(response.message.as_deref(), Some("Validation failed"));
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every versioned route, each group gated by its permission
pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{
        auth as auth_h, customers, dashboard, health, inventory, invoices, job_work, parts,
        processes, purchase_orders, receipts, sales_orders, settings, suppliers, tooling,
    };

    let auth_public = Router::new()
        .route("/auth/register", post(auth_h::register))
        .route("/auth/login", post(auth_h::login));

    let auth_session = Router::new()
        .route("/auth/logout", post(auth_h::logout))
        .route("/auth/me", get(auth_h::me))
        .with_auth();

    let users = Router::new()
        .route("/users", get(auth_h::list_users))
        .with_permission(perm::USERS_MANAGE);

    let settings_read = Router::new()
        .route("/settings", get(settings::get_settings))
        .with_permission(perm::SETTINGS_READ);

    let settings_update = Router::new()
        .route("/settings", put(settings::update_settings))
        .with_permission(perm::SETTINGS_UPDATE);

    let processes_read = Router::new()
        .route("/processes", get(processes::list_processes))
        .route("/processes/:id", get(processes::get_process))
        .with_permission(perm::PROCESSES_READ);

    let processes_create = Router::new()
        .route("/processes", post(processes::create_process))
        .with_permission(perm::PROCESSES_CREATE);

    let parts_read = Router::new()
        .route("/parts", get(parts::list_parts))
        .route("/parts/:id", get(parts::get_part))
        .route("/parts/:id/price-history", get(parts::price_history))
        .with_permission(perm::PARTS_READ);

    let parts_create = Router::new()
        .route("/parts", post(parts::create_part))
        .with_permission(perm::PARTS_CREATE);

    let parts_update = Router::new()
        .route("/parts/:id", put(parts::update_part))
        .with_permission(perm::PARTS_UPDATE);

    let customers_read = Router::new()
        .route("/customers", get(customers::list_customers))
        .route("/customers/:id", get(customers::get_customer))
        .with_permission(perm::CUSTOMERS_READ);

    let customers_create = Router::new()
        .route("/customers", post(customers::create_customer))
        .with_permission(perm::CUSTOMERS_CREATE);

    let customers_update = Router::new()
        .route("/customers/:id", put(customers::update_customer))
        .with_permission(perm::CUSTOMERS_UPDATE);

    let suppliers_read = Router::new()
        .route("/suppliers", get(suppliers::list_suppliers))
        .route("/suppliers/:id", get(suppliers::get_supplier))
        .with_permission(perm::SUPPLIERS_READ);

    let suppliers_create = Router::new()
        .route("/suppliers", post(suppliers::create_supplier))
        .with_permission(perm::SUPPLIERS_CREATE);

    let suppliers_update = Router::new()
        .route("/suppliers/:id", put(suppliers::update_supplier))
        .with_permission(perm::SUPPLIERS_UPDATE);

    let tooling_read = Router::new()
        .route("/tooling", get(tooling::list_tooling))
        .route("/tooling/:id", get(tooling::get_tooling))
        .with_permission(perm::TOOLING_READ);

    let tooling_create = Router::new()
        .route("/tooling", post(tooling::onboard_tooling))
        .with_permission(perm::TOOLING_CREATE);

    let tooling_update = Router::new()
        .route("/tooling/:id", put(tooling::update_tooling))
        .route("/tooling/:id/cycles", post(tooling::record_cycles))
        .with_permission(perm::TOOLING_UPDATE);

    let sales_orders_read = Router::new()
        .route("/sales-orders", get(sales_orders::list_sales_orders))
        .route("/sales-orders/:id", get(sales_orders::get_sales_order))
        .route(
            "/sales-orders/:id/invoiceable",
            get(sales_orders::invoiceable_lines),
        )
        .with_permission(perm::SALES_ORDERS_READ);

    let sales_orders_create = Router::new()
        .route("/sales-orders", post(sales_orders::create_sales_order))
        .with_permission(perm::SALES_ORDERS_CREATE);

    let sales_orders_delete = Router::new()
        .route(
            "/sales-orders/:id",
            axum::routing::delete(sales_orders::delete_sales_order),
        )
        .with_permission(perm::SALES_ORDERS_DELETE);

    let purchase_orders_read = Router::new()
        .route("/purchase-orders", get(purchase_orders::list_purchase_orders))
        .route(
            "/purchase-orders/:id",
            get(purchase_orders::get_purchase_order),
        )
        .with_permission(perm::PURCHASE_ORDERS_READ);

    let purchase_orders_create = Router::new()
        .route(
            "/purchase-orders",
            post(purchase_orders::create_purchase_order),
        )
        .route(
            "/sales-orders/:id/purchase-orders",
            post(sales_orders::create_purchase_orders),
        )
        .with_permission(perm::PURCHASE_ORDERS_CREATE);

    let purchase_orders_approve = Router::new()
        .route(
            "/purchase-orders/:id/approve",
            post(purchase_orders::approve_purchase_order),
        )
        .with_permission(perm::PURCHASE_ORDERS_APPROVE);

    let receipts_read = Router::new()
        .route("/receipts", get(receipts::list_grns))
        .route("/receipts/:id", get(receipts::get_grn))
        .with_permission(perm::RECEIPTS_READ);

    let receipts_create = Router::new()
        .route("/receipts", post(receipts::process_grn))
        .with_permission(perm::RECEIPTS_CREATE);

    let invoices_read = Router::new()
        .route("/supplier-invoices", get(invoices::list_supplier_invoices))
        .route(
            "/supplier-invoices/job-work/pending",
            get(invoices::pending_job_work_invoices),
        )
        .route("/customer-invoices", get(invoices::list_customer_invoices))
        .route(
            "/customer-invoices/:id",
            get(invoices::get_customer_invoice),
        )
        .with_permission(perm::INVOICES_READ);

    let invoices_create = Router::new()
        .route(
            "/supplier-invoices",
            post(invoices::process_supplier_invoice),
        )
        .route(
            "/supplier-invoices/job-work",
            post(invoices::process_job_work_invoice),
        )
        .route(
            "/customer-invoices",
            post(invoices::process_customer_invoice),
        )
        .with_permission(perm::INVOICES_CREATE);

    let job_work_read = Router::new()
        .route("/job-work/pending", get(job_work::pending_processes))
        .route("/job-work", get(job_work::list_job_work_orders))
        .route("/job-work/:id", get(job_work::get_job_work_order))
        .with_permission(perm::JOB_WORK_READ);

    let job_work_create = Router::new()
        .route("/job-work", post(job_work::issue_job_work))
        .with_permission(perm::JOB_WORK_CREATE);

    let job_work_update = Router::new()
        .route("/job-work/:id/status", put(job_work::update_job_work_status))
        .route("/job-work/:id/inward", post(job_work::inward_job_work))
        .with_permission(perm::JOB_WORK_UPDATE);

    let inventory_read = Router::new()
        .route("/inventory", get(inventory::stock_overview))
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route("/inventory/adjustments", get(inventory::list_adjustments))
        .route("/parts/:id/movements", get(parts::part_movements))
        .with_permission(perm::INVENTORY_READ);

    let inventory_adjust = Router::new()
        .route("/inventory/adjustments", post(inventory::adjust_stock))
        .with_permission(perm::INVENTORY_ADJUST);

    let reports = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/reports/summary", get(dashboard::summary_report))
        .with_permission(perm::REPORTS_READ);

    Router::new()
        .route("/status", get(health::status))
        .route("/health", get(health::health))
        .merge(auth_public)
        .merge(auth_session)
        .merge(users)
        .merge(settings_read)
        .merge(settings_update)
        .merge(processes_read)
        .merge(processes_create)
        .merge(parts_read)
        .merge(parts_create)
        .merge(parts_update)
        .merge(customers_read)
        .merge(customers_create)
        .merge(customers_update)
        .merge(suppliers_read)
        .merge(suppliers_create)
        .merge(suppliers_update)
        .merge(tooling_read)
        .merge(tooling_create)
        .merge(tooling_update)
        .merge(sales_orders_read)
        .merge(sales_orders_create)
        .merge(sales_orders_delete)
        .merge(purchase_orders_read)
        .merge(purchase_orders_create)
        .merge(purchase_orders_approve)
        .merge(receipts_read)
        .merge(receipts_create)
        .merge(invoices_read)
        .merge(invoices_create)
        .merge(job_work_read)
        .merge(job_work_create)
        .merge(job_work_update)
        .merge(inventory_read)
        .merge(inventory_adjust)
        .merge(reports)
}

/// Versioned API plus Swagger UI with request-id, tracing and auth plumbing.
/// CORS and compression are added by the server binary.
pub fn app_router(state: AppState) -> Router {
    let auth_service = state.auth_service();

    Router::<AppState>::new()
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        // Inject AuthService into request extensions for auth middleware
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
             mut req: axum::http::Request<axum::body::Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
