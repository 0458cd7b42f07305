use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::job_work_order,
    errors::ServiceError,
    services::{
        job_work::{
            InwardJobWorkRequest, IssueJobWorkRequest, JobWorkFilter, PendingProcess,
            UpdateJobWorkStatusRequest,
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

/// Stages ready to be sent to a subcontractor, with priced suppliers
#[utoipa::path(
    get,
    path = "/api/v1/job-work/pending",
    responses(
        (status = 200, description = "Pending process stages", body = ApiResponse<Vec<PendingProcess>>),
    ),
    security(("Bearer" = [])),
    tag = "job-work"
)]
pub async fn pending_processes(State(state): State<AppState>) -> ApiResult<Vec<PendingProcess>> {
    let pending = state.services.job_work.pending_processes().await?;
    Ok(success_response(pending))
}

#[utoipa::path(
    get,
    path = "/api/v1/job-work",
    params(JobWorkFilter, PaginationParams),
    responses(
        (status = 200, description = "Job-work orders", body = ApiResponse<Page<job_work_order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "job-work"
)]
pub async fn list_job_work_orders(
    State(state): State<AppState>,
    Query(filter): Query<JobWorkFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<job_work_order::Model>> {
    let page = state
        .services
        .job_work
        .list_job_work_orders(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/job-work",
    request_body = IssueJobWorkRequest,
    responses(
        (status = 201, description = "Job-work order issued", body = ApiResponse<job_work_order::Model>),
        (status = 400, description = "Stage not ready or supplier has no price", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced record missing", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "job-work"
)]
pub async fn issue_job_work(
    State(state): State<AppState>,
    Json(request): Json<IssueJobWorkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<job_work_order::Model>>), ServiceError> {
    let order = state.services.job_work.issue_job_work(request).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/job-work/{id}",
    params(("id" = Uuid, Path, description = "Job-work order id")),
    responses(
        (status = 200, description = "Job-work order", body = ApiResponse<job_work_order::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "job-work"
)]
pub async fn get_job_work_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<job_work_order::Model> {
    let order = state.services.job_work.get_job_work_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/job-work/{id}/status",
    params(("id" = Uuid, Path, description = "Job-work order id")),
    request_body = UpdateJobWorkStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<job_work_order::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "job-work"
)]
pub async fn update_job_work_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateJobWorkStatusRequest>,
) -> ApiResult<job_work_order::Model> {
    let order = state
        .services
        .job_work
        .update_job_work_status(id, request)
        .await?;
    Ok(success_response(order))
}

/// Receive processed goods back from the subcontractor
#[utoipa::path(
    post,
    path = "/api/v1/job-work/{id}/inward",
    params(("id" = Uuid, Path, description = "Job-work order id")),
    request_body = InwardJobWorkRequest,
    responses(
        (status = 200, description = "Job-work order inwarded", body = ApiResponse<job_work_order::Model>),
        (status = 400, description = "Already inwarded", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "job-work"
)]
pub async fn inward_job_work(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InwardJobWorkRequest>,
) -> ApiResult<job_work_order::Model> {
    let order = state.services.job_work.inward_job_work(id, request).await?;
    Ok(success_response(order))
}
