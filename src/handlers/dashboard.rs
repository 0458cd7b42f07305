use super::common::success_response;
use crate::{
    services::{dashboard::DashboardSummary, reports::SummaryReport},
    ApiResponse, ApiResult, AppState,
};
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Counters and recent activity", body = ApiResponse<DashboardSummary>),
    ),
    security(("Bearer" = [])),
    tag = "reports"
)]
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let summary = state.services.dashboard.dashboard_summary().await?;
    Ok(success_response(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    responses(
        (status = 200, description = "Sales against purchases with top counterparties", body = ApiResponse<SummaryReport>),
    ),
    security(("Bearer" = [])),
    tag = "reports"
)]
pub async fn summary_report(State(state): State<AppState>) -> ApiResult<SummaryReport> {
    let report = state.services.reports.summary_report().await?;
    Ok(success_response(report))
}
