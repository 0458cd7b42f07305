pub mod auth;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod job_work;
pub mod parts;
pub mod processes;
pub mod purchase_orders;
pub mod receipts;
pub mod sales_orders;
pub mod settings;
pub mod suppliers;
pub mod tooling;

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        customers::CustomerService, dashboard::DashboardService, inventory::InventoryService,
        invoicing::InvoicingService, job_work::JobWorkService, parts::PartService,
        processes::ProcessService, purchase_orders::PurchaseOrderService,
        receipts::ReceiptService, reports::ReportService, sales_orders::SalesOrderService,
        settings::SettingsService, suppliers::SupplierService, tooling::ToolingService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub settings: Arc<SettingsService>,
    pub processes: Arc<ProcessService>,
    pub parts: Arc<PartService>,
    pub customers: Arc<CustomerService>,
    pub suppliers: Arc<SupplierService>,
    pub tooling: Arc<ToolingService>,
    pub sales_orders: Arc<SalesOrderService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub receipts: Arc<ReceiptService>,
    pub invoicing: Arc<InvoicingService>,
    pub job_work: Arc<JobWorkService>,
    pub inventory: Arc<InventoryService>,
    pub dashboard: Arc<DashboardService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(
            AuthConfig::from(config),
            db_pool.clone(),
            event_sender.clone(),
        ));

        Self {
            auth,
            settings: Arc::new(SettingsService::new(db_pool.clone(), event_sender.clone())),
            processes: Arc::new(ProcessService::new(db_pool.clone(), event_sender.clone())),
            parts: Arc::new(PartService::new(db_pool.clone(), event_sender.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone(), event_sender.clone())),
            suppliers: Arc::new(SupplierService::new(db_pool.clone(), event_sender.clone())),
            tooling: Arc::new(ToolingService::new(db_pool.clone(), event_sender.clone())),
            sales_orders: Arc::new(SalesOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            receipts: Arc::new(ReceiptService::new(db_pool.clone(), event_sender.clone())),
            invoicing: Arc::new(InvoicingService::new(db_pool.clone(), event_sender.clone())),
            job_work: Arc::new(JobWorkService::new(db_pool.clone(), event_sender.clone())),
            inventory: Arc::new(InventoryService::new(
                db_pool.clone(),
                event_sender,
                config.low_stock_threshold,
            )),
            dashboard: Arc::new(DashboardService::new(
                db_pool.clone(),
                config.dashboard_low_stock_threshold,
            )),
            reports: Arc::new(ReportService::new(db_pool)),
        }
    }
}
