pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod invoicing;
pub mod job_work;
pub mod parts;
pub mod processes;
pub mod purchase_orders;
pub mod receipts;
pub mod reports;
pub mod sales_orders;
pub mod settings;
pub mod suppliers;
pub mod tooling;

use crate::errors::ServiceError;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;
use utoipa::ToSchema;

/// One page of a listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// Page request with 1-based page numbers
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// Runs `select` as a paginated query
pub(crate) async fn fetch_page<'db, C, E>(
    select: Select<E>,
    db: &'db C,
    request: PageRequest,
) -> Result<Page<E::Model>, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync + 'db,
{
    let paginator = select.paginate(db, request.limit);
    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let items = paginator
        .fetch_page(request.page - 1)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(Page {
        items,
        total,
        page: request.page,
        limit: request.limit,
        total_pages: total.div_ceil(request.limit),
    })
}

/// Next human-readable code of the form `{prefix}{n:0width}`, based on existing row count
pub(crate) async fn sequential_code<'db, C, E>(
    select: Select<E>,
    db: &'db C,
    prefix: &str,
    width: usize,
) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync + 'db,
{
    let existing = select.count(db).await.map_err(ServiceError::db_error)?;
    Ok(format_code(prefix, existing + 1, width))
}

pub(crate) fn format_code(prefix: &str, n: u64, width: usize) -> String {
    format!("{}{:0width$}", prefix, n, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_zero_padded() {
        assert_eq!(format_code("GKP-", 7, 6), "GKP-000007");
        assert_eq!(format_code("CUST-", 12, 4), "CUST-0012");
        assert_eq!(format_code("V-", 12345, 4), "V-12345");
    }

    #[test]
    fn page_request_is_one_based() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 1);
    }
}
