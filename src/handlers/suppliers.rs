use super::common::{created_response, success_response, PaginationParams};
use crate::{
    entities::supplier,
    errors::ServiceError,
    services::{
        suppliers::{CreateSupplierRequest, SupplierDetail, SupplierFilter, UpdateSupplierRequest},
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
    path = "/api/v1/suppliers",
    params(SupplierFilter, PaginationParams),
    responses(
        (status = 200, description = "Suppliers", body = ApiResponse<Page<supplier::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(filter): Query<SupplierFilter>,
    Query(paging): Query<PaginationParams>,
) -> ApiResult<Page<supplier::Model>> {
    let page = state
        .services
        .suppliers
        .list_suppliers(filter, paging.page_request(&state.config))
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<SupplierDetail>),
        (status = 400, description = "Invalid supplier", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SupplierDetail>>), ServiceError> {
    let supplier = state.services.suppliers.create_supplier(request).await?;
    Ok(created_response(supplier))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier with process pricing", body = ApiResponse<SupplierDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SupplierDetail> {
    let supplier = state.services.suppliers.get_supplier(id).await?;
    Ok(success_response(supplier))
}

#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated", body = ApiResponse<SupplierDetail>),
        (status = 400, description = "Supplier has open purchase orders", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSupplierRequest>,
) -> ApiResult<SupplierDetail> {
    let supplier = state.services.suppliers.update_supplier(id, request).await?;
    Ok(success_response(supplier))
}
