use super::common::{created_response, success_response, PaginationParams};
use crate::{
    errors::ServiceError,
    services::{
        tooling::{
            OnboardToolingRequest, RecordCyclesRequest, ToolingFilter, ToolingView,
            UpdateToolingRequest,
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
    path = "/api/v1/tooling",
    params(ToolingFilter, PaginationParams),
    responses(
        (status = 200, description = "Tooling assets", body = ApiResponse<Page<ToolingView>>),
    ),
    security(("Bearer" = [])),
    tag = "tooling"
)]
pub async fn list_tooling(
    State(state): State<AppState>,
    Query(filter): Query<ToolingFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<ToolingView>> {
    let page = state
        .services
        .tooling
        .list_tooling(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

/// Onboard a batch of assets for one customer and part
#[utoipa::path(
    post,
    path = "/api/v1/tooling",
    request_body = OnboardToolingRequest,
    responses(
        (status = 201, description = "Assets registered", body = ApiResponse<Vec<ToolingView>>),
        (status = 409, description = "Asset number already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tooling"
)]
pub async fn onboard_tooling(
    State(state): State<AppState>,
    Json(request): Json<OnboardToolingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ToolingView>>>), ServiceError> {
    let assets = state.services.tooling.onboard_tooling(request).await?;
    Ok(created_response(assets))
}

#[utoipa::path(
    get,
    path = "/api/v1/tooling/{id}",
    params(("id" = Uuid, Path, description = "Tooling id")),
    responses(
        (status = 200, description = "Tooling asset", body = ApiResponse<ToolingView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tooling"
)]
pub async fn get_tooling(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ToolingView> {
    let tooling = state.services.tooling.get_tooling(id).await?;
    Ok(success_response(tooling))
}

#[utoipa::path(
    put,
    path = "/api/v1/tooling/{id}",
    params(("id" = Uuid, Path, description = "Tooling id")),
    request_body = UpdateToolingRequest,
    responses(
        (status = 200, description = "Tooling updated", body = ApiResponse<ToolingView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tooling"
)]
pub async fn update_tooling(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateToolingRequest>,
) -> ApiResult<ToolingView> {
    let tooling = state.services.tooling.update_tooling(id, request).await?;
    Ok(success_response(tooling))
}

#[utoipa::path(
    post,
    path = "/api/v1/tooling/{id}/cycles",
    params(("id" = Uuid, Path, description = "Tooling id")),
    request_body = RecordCyclesRequest,
    responses(
        (status = 200, description = "Cycles recorded", body = ApiResponse<ToolingView>),
        (status = 400, description = "Asset retired or cycles not positive", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tooling"
)]
pub async fn record_cycles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordCyclesRequest>,
) -> ApiResult<ToolingView> {
    let tooling = state.services.tooling.record_cycles(id, request).await?;
    Ok(success_response(tooling))
}
