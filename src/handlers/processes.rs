use super::common::{created_response, success_response};
use crate::{
    entities::process, errors::ServiceError, services::processes::CreateProcessRequest,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/processes",
    responses(
        (status = 200, description = "Manufacturing processes", body = ApiResponse<Vec<process::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "processes"
)]
pub async fn list_processes(State(state): State<AppState>) -> ApiResult<Vec<process::Model>> {
    let processes = state.services.processes.list_processes().await?;
    Ok(success_response(processes))
}

#[utoipa::path(
    post,
    path = "/api/v1/processes",
    request_body = CreateProcessRequest,
    responses(
        (status = 201, description = "Process created", body = ApiResponse<process::Model>),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "processes"
)]
pub async fn create_process(
    State(state): State<AppState>,
    Json(request): Json<CreateProcessRequest>,
) -> Result<(StatusCode, Json<ApiResponse<process::Model>>), ServiceError> {
    let process = state.services.processes.create_process(request).await?;
    Ok(created_response(process))
}

#[utoipa::path(
    get,
    path = "/api/v1/processes/{id}",
    params(("id" = Uuid, Path, description = "Process id")),
    responses(
        (status = 200, description = "Process", body = ApiResponse<process::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "processes"
)]
pub async fn get_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<process::Model> {
    let process = state.services.processes.get_process(id).await?;
    Ok(success_response(process))
}
