use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::purchase_order,
    errors::ServiceError,
    services::{
        purchase_orders::{CreatePurchaseOrderRequest, PurchaseOrderDetail, PurchaseOrderFilter},
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
    path = "/api/v1/purchase-orders",
    params(PurchaseOrderFilter, PaginationParams),
    responses(
        (status = 200, description = "Purchase orders, newest first", body = ApiResponse<Page<purchase_order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(filter): Query<PurchaseOrderFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<purchase_order::Model>> {
    let page = state
        .services
        .purchase_orders
        .list_purchase_orders(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order awaiting approval", body = ApiResponse<PurchaseOrderDetail>),
        (status = 400, description = "Invalid order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(request): Json<CreatePurchaseOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PurchaseOrderDetail>>), ServiceError> {
    let order = state
        .services
        .purchase_orders
        .create_purchase_order(request)
        .await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order with received and balance quantities", body = ApiResponse<PurchaseOrderDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PurchaseOrderDetail> {
    let order = state.services.purchase_orders.get_purchase_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/approve",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order released", body = ApiResponse<purchase_order::Model>),
        (status = 400, description = "Not awaiting approval", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<purchase_order::Model> {
    let order = state
        .services
        .purchase_orders
        .approve_purchase_order(id)
        .await?;
    Ok(success_response(order))
}
