use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::goods_receipt,
    errors::ServiceError,
    services::{
        receipts::{GoodsReceiptDetail, ProcessGrnRequest, ReceiptFilter},
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
    path = "/api/v1/receipts",
    params(ReceiptFilter, PaginationParams),
    responses(
        (status = 200, description = "Goods receipts", body = ApiResponse<Page<goods_receipt::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "receipts"
)]
pub async fn list_grns(
    State(state): State<AppState>,
    Query(filter): Query<ReceiptFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<goods_receipt::Model>> {
    let page = state
        .services
        .receipts
        .list_grns(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

/// Receive goods against a released purchase order
#[utoipa::path(
    post,
    path = "/api/v1/receipts",
    request_body = ProcessGrnRequest,
    responses(
        (status = 201, description = "Goods receipt recorded", body = ApiResponse<GoodsReceiptDetail>),
        (status = 400, description = "Purchase order cannot receive goods", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "receipts"
)]
pub async fn process_grn(
    State(state): State<AppState>,
    Json(request): Json<ProcessGrnRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GoodsReceiptDetail>>), ServiceError> {
    let receipt = state.services.receipts.process_grn(request).await?;
    Ok(created_response(receipt))
}

#[utoipa::path(
    get,
    path = "/api/v1/receipts/{id}",
    params(("id" = Uuid, Path, description = "Goods receipt id")),
    responses(
        (status = 200, description = "Goods receipt with items", body = ApiResponse<GoodsReceiptDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "receipts"
)]
pub async fn get_grn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<GoodsReceiptDetail> {
    let receipt = state.services.receipts.get_grn(id).await?;
    Ok(success_response(receipt))
}
