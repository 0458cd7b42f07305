use crate::{config::AppConfig, services::PageRequest, ApiResponse};
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Standard success body
pub fn success_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Standard no content response
pub fn no_content_response() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Pagination parameters for list operations
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page, capped by configuration
    pub limit: Option<u64>,
}

impl PaginationParams {
    pub fn page_request(&self, config: &AppConfig) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), config.page_size(self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_uses_configured_defaults() {
        let config = AppConfig::new(
            "sqlite::memory:".into(),
            "a-test-secret-that-is-long-enough-000".into(),
            3600,
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        let req = PaginationParams::default().page_request(&config);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, config.api_default_page_size);

        let req = PaginationParams {
            page: Some(3),
            limit: Some(10_000),
        }
        .page_request(&config);
        assert_eq!(req.page, 3);
        assert_eq!(req.limit, config.api_max_page_size);
    }
}
