use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::{customer_invoice, job_work_order, supplier_invoice},
    errors::ServiceError,
    services::{
        invoicing::{
            CustomerInvoiceDetail, CustomerInvoiceFilter, CustomerInvoiceRequest,
            JobWorkInvoiceRequest, SupplierInvoiceFilter, SupplierInvoiceRequest,
        },
        Page,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/supplier-invoices",
    params(SupplierInvoiceFilter, PaginationParams),
    responses(
        (status = 200, description = "Supplier invoices", body = ApiResponse<Page<supplier_invoice::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn list_supplier_invoices(
    State(state): State<AppState>,
    Query(filter): Query<SupplierInvoiceFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<supplier_invoice::Model>> {
    let page = state
        .services
        .invoicing
        .list_supplier_invoices(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

/// Book a supplier's bill against a received purchase order
#[utoipa::path(
    post,
    path = "/api/v1/supplier-invoices",
    request_body = SupplierInvoiceRequest,
    responses(
        (status = 201, description = "Supplier invoice recorded", body = ApiResponse<supplier_invoice::Model>),
        (status = 400, description = "Purchase order not received or already invoiced", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn process_supplier_invoice(
    State(state): State<AppState>,
    Json(request): Json<SupplierInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<supplier_invoice::Model>>), ServiceError> {
    let invoice = state
        .services
        .invoicing
        .process_supplier_invoice(request)
        .await?;
    Ok(created_response(invoice))
}

#[utoipa::path(
    get,
    path = "/api/v1/supplier-invoices/job-work/pending",
    responses(
        (status = 200, description = "Inwarded job-work orders not yet billed", body = ApiResponse<Vec<job_work_order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn pending_job_work_invoices(
    State(state): State<AppState>,
) -> ApiResult<Vec<job_work_order::Model>> {
    let orders = state.services.invoicing.pending_job_work_invoices().await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    post,
    path = "/api/v1/supplier-invoices/job-work",
    request_body = JobWorkInvoiceRequest,
    responses(
        (status = 201, description = "Job-work invoice recorded", body = ApiResponse<supplier_invoice::Model>),
        (status = 400, description = "Job-work order not inwarded or already invoiced", body = crate::errors::ErrorResponse),
        (status = 404, description = "Job-work order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn process_job_work_invoice(
    State(state): State<AppState>,
    Json(request): Json<JobWorkInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<supplier_invoice::Model>>), ServiceError> {
    let invoice = state
        .services
        .invoicing
        .process_job_work_invoice(request)
        .await?;
    Ok(created_response(invoice))
}

#[utoipa::path(
    get,
    path = "/api/v1/customer-invoices",
    params(CustomerInvoiceFilter, PaginationParams),
    responses(
        (status = 200, description = "Customer invoices", body = ApiResponse<Page<customer_invoice::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn list_customer_invoices(
    State(state): State<AppState>,
    Query(filter): Query<CustomerInvoiceFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<customer_invoice::Model>> {
    let page = state
        .services
        .invoicing
        .list_customer_invoices(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

/// Bill received quantities of a sales order and ship them out of stock
#[utoipa::path(
    post,
    path = "/api/v1/customer-invoices",
    request_body = CustomerInvoiceRequest,
    responses(
        (status = 201, description = "Customer invoice raised", body = ApiResponse<CustomerInvoiceDetail>),
        (status = 400, description = "Nothing available to invoice", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn process_customer_invoice(
    State(state): State<AppState>,
    Json(request): Json<CustomerInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerInvoiceDetail>>), ServiceError> {
    let invoice = state
        .services
        .invoicing
        .process_customer_invoice(request)
        .await?;
    Ok(created_response(invoice))
}

#[utoipa::path(
    get,
    path = "/api/v1/customer-invoices/{id}",
    params(("id" = Uuid, Path, description = "Customer invoice id")),
    responses(
        (status = 200, description = "Customer invoice with items", body = ApiResponse<CustomerInvoiceDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "invoices"
)]
pub async fn get_customer_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CustomerInvoiceDetail> {
    let invoice = state.services.invoicing.get_customer_invoice(id).await?;
    Ok(success_response(invoice))
}
