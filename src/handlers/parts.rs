use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::{part, part_price_history},
    errors::ServiceError,
    services::{
        inventory::PartMovements,
        parts::{CreatePartRequest, PartDetail, PartFilter, UpdatePartRequest},
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
    path = "/api/v1/parts",
    params(PartFilter, PaginationParams),
    responses(
        (status = 200, description = "Parts", body = ApiResponse<Page<part::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "parts"
)]
pub async fn list_parts(
    State(state): State<AppState>,
    Query(filter): Query<PartFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<part::Model>> {
    let page = state
        .services
        .parts
        .list_parts(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/parts",
    request_body = CreatePartRequest,
    responses(
        (status = 201, description = "Part created", body = ApiResponse<PartDetail>),
        (status = 400, description = "Invalid part", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced record missing", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "parts"
)]
pub async fn create_part(
    State(state): State<AppState>,
    Json(request): Json<CreatePartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PartDetail>>), ServiceError> {
    let part = state.services.parts.create_part(request).await?;
    Ok(created_response(part))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}",
    params(("id" = Uuid, Path, description = "Part id")),
    responses(
        (status = 200, description = "Part with route and price history", body = ApiResponse<PartDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "parts"
)]
pub async fn get_part(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<PartDetail> {
    let part = state.services.parts.get_part(id).await?;
    Ok(success_response(part))
}

#[utoipa::path(
    put,
    path = "/api/v1/parts/{id}",
    params(("id" = Uuid, Path, description = "Part id")),
    request_body = UpdatePartRequest,
    responses(
        (status = 200, description = "Part updated", body = ApiResponse<PartDetail>),
        (status = 400, description = "Part is on open orders or the update is invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "parts"
)]
pub async fn update_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePartRequest>,
) -> ApiResult<PartDetail> {
    let part = state.services.parts.update_part(id, request).await?;
    Ok(success_response(part))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}/price-history",
    params(("id" = Uuid, Path, description = "Part id")),
    responses(
        (status = 200, description = "Price revisions, newest first", body = ApiResponse<Vec<part_price_history::Model>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "parts"
)]
pub async fn price_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<part_price_history::Model>> {
    let history = state.services.parts.price_history(id).await?;
    Ok(success_response(history))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}/movements",
    params(("id" = Uuid, Path, description = "Part id")),
    responses(
        (status = 200, description = "Stock movements with daily totals", body = ApiResponse<PartMovements>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn part_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PartMovements> {
    let movements = state.services.inventory.part_movements(id).await?;
    Ok(success_response(movements))
}
