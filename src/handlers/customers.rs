use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::customer,
    errors::ServiceError,
    services::{
        customers::{CreateCustomerRequest, CustomerFilter, UpdateCustomerRequest},
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
    path = "/api/v1/customers",
    params(CustomerFilter, PaginationParams),
    responses(
        (status = 200, description = "Customers", body = ApiResponse<Page<customer::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<customer::Model>> {
    let page = state
        .services
        .customers
        .list_customers(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid customer", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<customer::Model>>), ServiceError> {
    let customer = state.services.customers.create_customer(request).await?;
    Ok(created_response(customer))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = ApiResponse<customer::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(success_response(customer))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<customer::Model>),
        (status = 400, description = "Customer has open sales orders", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.update_customer(id, request).await?;
    Ok(success_response(customer))
}
