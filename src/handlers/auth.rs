use super::common::{created_response, success_response};
use crate::{
    auth::{AuthResponse, AuthUser, LoginRequest, RegisterRequest, UserProfile},
    errors::ServiceError,
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, http::StatusCode, Json};

/// Create an account and receive an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid registration data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ServiceError> {
    let response = state.services.auth.register(request).await?;
    Ok(created_response(response))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.services.auth.login(request).await?;
    Ok(success_response(response))
}

/// Revoke the presented access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, caller: AuthUser) -> StatusCode {
    state.services.auth.logout(&caller).await;
    StatusCode::NO_CONTENT
}

/// Current account
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn me(State(state): State<AppState>, caller: AuthUser) -> ApiResult<UserProfile> {
    let profile = state.services.auth.me(&caller).await?;
    Ok(success_response(profile))
}

/// All user accounts (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "User accounts", body = ApiResponse<Vec<UserProfile>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    let users = state.services.auth.list_users().await?;
    Ok(success_response(users))
}
