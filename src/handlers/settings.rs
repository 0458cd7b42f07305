use super::common::success_response;
use crate::{
    entities::company_settings, services::settings::UpdateSettingsRequest, ApiResponse,
    ApiResult, AppState,
};
use axum::{extract::State, Json};

/// Company profile and document numbering
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses(
        (status = 200, description = "Company settings", body = ApiResponse<company_settings::Model>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<company_settings::Model> {
    let settings = state.services.settings.get_settings().await?;
    Ok(success_response(settings))
}

/// Update any subset of the company settings
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<company_settings::Model>),
        (status = 400, description = "Invalid settings", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<company_settings::Model> {
    let settings = state.services.settings.update_settings(request).await?;
    Ok(success_response(settings))
}
