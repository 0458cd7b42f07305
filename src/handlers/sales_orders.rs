use super::common::{created_response, no_content_response, success_response, PaginationParams};
use crate::{
    entities::sales_order,
    errors::ServiceError,
    services::{
        invoicing::InvoiceableLine,
        purchase_orders::PurchaseOrderDetail,
        sales_orders::{CreateSalesOrderRequest, SalesOrderDetail, SalesOrderFilter},
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
    path = "/api/v1/sales-orders",
    params(SalesOrderFilter, PaginationParams),
    responses(
        (status = 200, description = "Sales orders, newest first", body = ApiResponse<Page<sales_order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn list_sales_orders(
    State(state): State<AppState>,
    Query(filter): Query<SalesOrderFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<sales_order::Model>> {
    let page = state
        .services
        .sales_orders
        .list_sales_orders(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/sales-orders",
    request_body = CreateSalesOrderRequest,
    responses(
        (status = 201, description = "Sales order confirmed", body = ApiResponse<SalesOrderDetail>),
        (status = 400, description = "Invalid order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or part missing", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn create_sales_order(
    State(state): State<AppState>,
    Json(request): Json<CreateSalesOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SalesOrderDetail>>), ServiceError> {
    let order = state.services.sales_orders.create_sales_order(request).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}",
    params(("id" = Uuid, Path, description = "Sales order id")),
    responses(
        (status = 200, description = "Sales order with items", body = ApiResponse<SalesOrderDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn get_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SalesOrderDetail> {
    let order = state.services.sales_orders.get_sales_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sales-orders/{id}",
    params(("id" = Uuid, Path, description = "Sales order id")),
    responses(
        (status = 204, description = "Sales order deleted"),
        (status = 400, description = "Order is not completed or has open purchase orders", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn delete_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.sales_orders.delete_sales_order(id).await?;
    Ok(no_content_response())
}

/// Raise one purchase order per primary supplier for a confirmed sales order
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders/{id}/purchase-orders",
    params(("id" = Uuid, Path, description = "Sales order id")),
    responses(
        (status = 201, description = "Purchase orders raised", body = ApiResponse<Vec<PurchaseOrderDetail>>),
        (status = 400, description = "Sales order is not confirmed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn create_purchase_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<PurchaseOrderDetail>>>), ServiceError> {
    let orders = state
        .services
        .purchase_orders
        .create_from_sales_order(id)
        .await?;
    Ok(created_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}/invoiceable",
    params(("id" = Uuid, Path, description = "Sales order id")),
    responses(
        (status = 200, description = "Quantities available to bill per line", body = ApiResponse<Vec<InvoiceableLine>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn invoiceable_lines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<InvoiceableLine>> {
    let lines = state.services.invoicing.invoiceable_lines(id).await?;
    Ok(success_response(lines))
}
