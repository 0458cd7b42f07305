use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::stock_adjustment,
    errors::ServiceError,
    services::{
        inventory::{AdjustmentFilter, StockAdjustmentRequest, StockLine, StockOverview, StockQuery},
        Page,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(StockQuery),
    responses(
        (status = 200, description = "Stock and valuation per part", body = ApiResponse<StockOverview>),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn stock_overview(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> ApiResult<StockOverview> {
    let overview = state
        .services
        .inventory
        .stock_overview(query.threshold)
        .await?;
    Ok(success_response(overview))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(StockQuery),
    responses(
        (status = 200, description = "Parts below the threshold", body = ApiResponse<Vec<StockLine>>),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> ApiResult<Vec<StockLine>> {
    let lines = state.services.inventory.low_stock(query.threshold).await?;
    Ok(success_response(lines))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/adjustments",
    request_body = StockAdjustmentRequest,
    responses(
        (status = 201, description = "Adjustment recorded", body = ApiResponse<stock_adjustment::Model>),
        (status = 400, description = "Zero quantity or missing reason", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock would go negative", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(request): Json<StockAdjustmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<stock_adjustment::Model>>), ServiceError> {
    let adjustment = state.services.inventory.adjust_stock(request).await?;
    Ok(created_response(adjustment))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/adjustments",
    params(AdjustmentFilter, PaginationParams),
    responses(
        (status = 200, description = "Stock adjustments", body = ApiResponse<Page<stock_adjustment::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn list_adjustments(
    State(state): State<AppState>,
    Query(filter): Query<AdjustmentFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<stock_adjustment::Model>> {
    let page = state
        .services
        .inventory
        .list_adjustments(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}
