use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SCM Hub API",
        version = "0.1.0",
        description = r#"
# SCM Hub

Order-to-cash and procure-to-pay backend for a contract manufacturer.

## Features

- **Master data**: processes, parts with process routes, customers, suppliers with process pricing, tooling assets
- **Sales orders**: customer orders that drive purchasing and job work
- **Purchasing**: purchase orders per primary supplier, approval, goods receipt
- **Job work**: stage-by-stage subcontracting of a part's process route
- **Invoicing**: supplier bills, job-work bills, customer invoices against received quantities
- **Inventory**: stock valuation, low-stock alerts, manual adjustments, movement history

## Authentication

Every route except `/auth/register`, `/auth/login`, `/status` and `/health` needs a JWT:

```
Authorization: Bearer <token>
```

## Pagination

List endpoints take `page` (default 1) and `limit` (server default, capped by configuration).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Sign-up, login and sessions"),
        (name = "settings", description = "Company profile and document numbering"),
        (name = "processes", description = "Manufacturing process catalogue"),
        (name = "parts", description = "Parts, process routes and price history"),
        (name = "customers", description = "Customer master"),
        (name = "suppliers", description = "Supplier master and process pricing"),
        (name = "tooling", description = "Customer-owned tooling assets"),
        (name = "sales-orders", description = "Customer orders"),
        (name = "purchase-orders", description = "Supplier orders and approval"),
        (name = "receipts", description = "Goods receipt notes"),
        (name = "invoices", description = "Supplier and customer invoices"),
        (name = "job-work", description = "Subcontracted process stages"),
        (name = "inventory", description = "Stock, valuation and adjustments"),
        (name = "reports", description = "Dashboard and summary reports"),
        (name = "health", description = "Liveness and readiness")
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::auth::list_users,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,
        crate::handlers::processes::list_processes,
        crate::handlers::processes::create_process,
        crate::handlers::processes::get_process,
        crate::handlers::parts::list_parts,
        crate::handlers::parts::create_part,
        crate::handlers::parts::get_part,
        crate::handlers::parts::update_part,
        crate::handlers::parts::price_history,
        crate::handlers::parts::part_movements,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::tooling::list_tooling,
        crate::handlers::tooling::onboard_tooling,
        crate::handlers::tooling::get_tooling,
        crate::handlers::tooling::update_tooling,
        crate::handlers::tooling::record_cycles,
        crate::handlers::sales_orders::list_sales_orders,
        crate::handlers::sales_orders::create_sales_order,
        crate::handlers::sales_orders::get_sales_order,
        crate::handlers::sales_orders::delete_sales_order,
        crate::handlers::sales_orders::create_purchase_orders,
        crate::handlers::sales_orders::invoiceable_lines,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::approve_purchase_order,
        crate::handlers::receipts::list_grns,
        crate::handlers::receipts::process_grn,
        crate::handlers::receipts::get_grn,
        crate::handlers::invoices::list_supplier_invoices,
        crate::handlers::invoices::process_supplier_invoice,
        crate::handlers::invoices::pending_job_work_invoices,
        crate::handlers::invoices::process_job_work_invoice,
        crate::handlers::invoices::list_customer_invoices,
        crate::handlers::invoices::process_customer_invoice,
        crate::handlers::invoices::get_customer_invoice,
        crate::handlers::job_work::pending_processes,
        crate::handlers::job_work::list_job_work_orders,
        crate::handlers::job_work::issue_job_work,
        crate::handlers::job_work::get_job_work_order,
        crate::handlers::job_work::update_job_work_status,
        crate::handlers::job_work::inward_job_work,
        crate::handlers::inventory::stock_overview,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::adjust_stock,
        crate::handlers::inventory::list_adjustments,
        crate::handlers::dashboard::dashboard,
        crate::handlers::dashboard::summary_report,
        crate::handlers::health::status,
        crate::handlers::health::health,
    ),
    components(schemas(crate::errors::ErrorResponse, crate::ResponseMeta))
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_workflow_paths_and_bearer_scheme() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("SCM Hub API"));
        assert!(json.contains("/api/v1/sales-orders/{id}/purchase-orders"));
        assert!(json.contains("/api/v1/job-work/{id}/inward"));
        assert!(json.contains("\"Bearer\""));
    }
}
