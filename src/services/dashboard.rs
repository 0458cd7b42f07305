use crate::{
    db::DbPool,
    entities::{goods_receipt, part, purchase_order, sales_order, OrderStatus},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

const RECENT_LIMIT: u64 = 5;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub sales_order_count: u64,
    pub purchase_order_count: u64,
    pub low_stock_count: u64,
    pub goods_receipt_count: u64,
    pub low_stock_threshold: i32,
    pub recent_sales_orders: Vec<sales_order::Model>,
    pub open_purchase_orders: Vec<purchase_order::Model>,
}

/// Landing-page counters
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    low_stock_threshold: i32,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, low_stock_threshold: i32) -> Self {
        Self {
            db_pool,
            low_stock_threshold,
        }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ServiceError> {
        let db = &*self.db_pool;

        let sales_order_count = sales_order::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        let purchase_order_count = purchase_order::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        let goods_receipt_count = goods_receipt::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        let low_stock_count = part::Entity::find()
            .filter(part::Column::Stock.lt(self.low_stock_threshold))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let recent_sales_orders = sales_order::Entity::find()
            .order_by_desc(sales_order::Column::CreatedAt)
            .limit(RECENT_LIMIT)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let open_purchase_orders = purchase_order::Entity::find()
            .filter(
                purchase_order::Column::Status
                    .is_not_in([OrderStatus::Invoiced, OrderStatus::Completed]),
            )
            .order_by_desc(purchase_order::Column::CreatedAt)
            .limit(RECENT_LIMIT)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(DashboardSummary {
            sales_order_count,
            purchase_order_count,
            low_stock_count,
            goods_receipt_count,
            low_stock_threshold: self.low_stock_threshold,
            recent_sales_orders,
            open_purchase_orders,
        })
    }
}
