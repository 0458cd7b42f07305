use super::{
    fetch_page,
    settings::{allocate_number, DocumentKind},
    Page, PageRequest,
};
use crate::{
    db::DbPool,
    entities::{
        customer, customer_invoice, job_work_order, part, purchase_order, sales_order,
        sales_order_item,
        sales_order_item::NO_STAGE_COMPLETED, OrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_CUSTOMER_PO: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SalesOrderLineInput {
    pub part_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    /// Defaults to the part's selling price
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSalesOrderRequest {
    pub customer_id: Uuid,
    pub customer_po_number: Option<String>,
    /// Defaults to today
    pub order_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "A sales order needs at least one item"))]
    pub items: Vec<SalesOrderLineInput>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesOrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesOrderDetail {
    #[serde(flatten)]
    pub order: sales_order::Model,
    pub items: Vec<sales_order_item::Model>,
}

#[derive(Clone)]
pub struct SalesOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SalesOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, items = request.items.len()))]
    pub async fn create_sales_order(
        &self,
        request: CreateSalesOrderRequest,
    ) -> Result<SalesOrderDetail, ServiceError> {
        request.validate()?;
        for line in &request.items {
            line.validate()?;
            if matches!(line.unit_price, Some(p) if p < Decimal::ZERO) {
                return Err(ServiceError::ValidationError(
                    "Unit price cannot be negative".to_string(),
                ));
            }
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer", request.customer_id))?;
        if !customer.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Customer {} is inactive",
                customer.code
            )));
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let part = part::Entity::find_by_id(line.part_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::not_found("Part", line.part_id))?;
            if !part.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Part {} is inactive",
                    part.sku
                )));
            }
            let unit_price = line.unit_price.unwrap_or(part.selling_price);
            lines.push((part.id, line.quantity, unit_price));
        }
        let total: Decimal = lines
            .iter()
            .map(|(_, qty, price)| *price * Decimal::from(*qty))
            .sum();

        let number = allocate_number(&txn, DocumentKind::SalesOrder).await?;
        let now = Utc::now();
        let order = sales_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number),
            customer_id: Set(customer.id),
            customer_po_number: Set(request
                .customer_po_number
                .filter(|po| !po.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CUSTOMER_PO.to_string())),
            order_date: Set(request.order_date.unwrap_or_else(|| now.date_naive())),
            status: Set(OrderStatus::Confirmed),
            total_amount: Set(total),
            currency: Set(customer.currency.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(lines.len());
        for (part_id, quantity, unit_price) in lines {
            let item = sales_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sales_order_id: Set(order.id),
                part_id: Set(part_id),
                quantity: Set(quantity),
                unit_price: Set(unit_price),
                invoiced_quantity: Set(0),
                completed_process_index: Set(NO_STAGE_COMPLETED),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(item);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.sales_orders.created", 1);
        info!(sales_order_id = %order.id, number = %order.number, total = %order.total_amount, "Sales order created");
        if let Err(e) = self.event_sender.send(Event::SalesOrderCreated(order.id)).await {
            warn!(error = %e, sales_order_id = %order.id, "Failed to send sales order created event");
        }

        Ok(SalesOrderDetail { order, items })
    }

    #[instrument(skip(self))]
    pub async fn get_sales_order(&self, id: Uuid) -> Result<SalesOrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = find_sales_order(db, id).await?;
        let items = load_items(db, id).await?;
        Ok(SalesOrderDetail { order, items })
    }

    /// Newest orders first
    #[instrument(skip(self))]
    pub async fn list_sales_orders(
        &self,
        filter: SalesOrderFilter,
        page: PageRequest,
    ) -> Result<Page<sales_order::Model>, ServiceError> {
        let mut query = sales_order::Entity::find()
            .order_by_desc(sales_order::Column::OrderDate)
            .order_by_desc(sales_order::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(sales_order::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    /// Removes a closed-out order whose purchase orders are settled
    #[instrument(skip(self))]
    pub async fn delete_sales_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let order = find_sales_order(&txn, id).await?;

        if order.status != OrderStatus::Completed {
            return Err(ServiceError::InvalidOperation(format!(
                "Sales order {} is {} and can only be deleted once Completed",
                order.number, order.status
            )));
        }

        let open_pos = purchase_order::Entity::find()
            .filter(purchase_order::Column::SalesOrderId.eq(id))
            .filter(
                purchase_order::Column::Status
                    .is_not_in([OrderStatus::Completed, OrderStatus::Invoiced]),
            )
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if open_pos > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Sales order {} still has {} open purchase order(s)",
                order.number, open_pos
            )));
        }

        // Settled documents stay on file and keep the deleted order's id as history
        let linked_pos = purchase_order::Entity::find()
            .filter(purchase_order::Column::SalesOrderId.eq(id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let linked_invoices = customer_invoice::Entity::find()
            .filter(customer_invoice::Column::SalesOrderId.eq(id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let linked_job_work = job_work_order::Entity::find()
            .filter(job_work_order::Column::SalesOrderId.eq(id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        sales_order_item::Entity::delete_many()
            .filter(sales_order_item::Column::SalesOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let order_number = order.number.clone();
        order.delete(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(sales_order_id = %id, number = %order_number, "Sales order deleted");
        if linked_pos + linked_invoices + linked_job_work > 0 {
            warn!(
                sales_order_id = %id,
                number = %order_number,
                purchase_orders = linked_pos,
                customer_invoices = linked_invoices,
                job_work_orders = linked_job_work,
                "Deleted sales order is still referenced by retained documents"
            );
        }
        if let Err(e) = self.event_sender.send(Event::SalesOrderDeleted(id)).await {
            warn!(error = %e, sales_order_id = %id, "Failed to send sales order deleted event");
        }
        Ok(())
    }
}

pub(crate) async fn find_sales_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<sales_order::Model, ServiceError> {
    sales_order::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Sales order", id))
}

pub(crate) async fn load_items<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<Vec<sales_order_item::Model>, ServiceError> {
    sales_order_item::Entity::find()
        .filter(sales_order_item::Column::SalesOrderId.eq(sales_order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Moves a sales order to `status`, returning the change event when the status actually moved
pub(crate) async fn set_status<C: ConnectionTrait>(
    conn: &C,
    order: sales_order::Model,
    status: OrderStatus,
) -> Result<Option<Event>, ServiceError> {
    if order.status == status {
        return Ok(None);
    }
    let old_status = order.status;
    let id = order.id;
    let mut active: sales_order::ActiveModel = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(ServiceError::db_error)?;
    Ok(Some(Event::SalesOrderStatusChanged {
        sales_order_id: id,
        old_status: old_status.to_string(),
        new_status: status.to_string(),
    }))
}

/// Sends a deferred status-change event, logging failures
pub(crate) async fn publish(sender: &EventSender, event: Option<Event>) {
    if let Some(event) = event {
        let name = event.name();
        if let Err(e) = sender.send(event).await {
            warn!(error = %e, event = name, "Failed to send event");
        }
    }
}
