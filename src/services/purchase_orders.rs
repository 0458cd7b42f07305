use super::{
    fetch_page,
    sales_orders::{find_sales_order, load_items, publish, set_status},
    settings::{allocate_number, load_or_init, DocumentKind},
    Page, PageRequest,
};
use crate::{
    db::DbPool,
    entities::{
        goods_receipt, goods_receipt_item, part, purchase_order, purchase_order_item, supplier,
        OrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderLineInput {
    pub part_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    /// Defaults to the part's cost price
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    pub sales_order_id: Option<Uuid>,
    pub order_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "A purchase order needs at least one item"))]
    pub items: Vec<PurchaseOrderLineInput>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderFilter {
    pub status: Option<OrderStatus>,
    pub supplier_id: Option<Uuid>,
    pub sales_order_id: Option<Uuid>,
}

/// Ordered line with what has arrived against it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseOrderLine {
    #[serde(flatten)]
    pub item: purchase_order_item::Model,
    pub received_quantity: i32,
    pub balance_quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: purchase_order::Model,
    pub items: Vec<PurchaseOrderLine>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Raises one purchase order per primary supplier for a confirmed sales order.
    /// Job-work parts are routed through subcontracting instead and are skipped.
    #[instrument(skip(self))]
    pub async fn create_from_sales_order(
        &self,
        sales_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderDetail>, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let order = find_sales_order(&txn, sales_order_id).await?;
        if order.status != OrderStatus::Confirmed {
            return Err(ServiceError::InvalidOperation(format!(
                "Sales order {} is {}; purchase orders can only be raised from Confirmed",
                order.number, order.status
            )));
        }

        let settings = load_or_init(&txn).await?;
        let items = load_items(&txn, order.id).await?;

        // supplier -> lines, kept in order of first appearance
        let mut supplier_order: Vec<Uuid> = Vec::new();
        let mut groups: HashMap<Uuid, Vec<(Uuid, i32, Decimal)>> = HashMap::new();
        for item in &items {
            let part = part::Entity::find_by_id(item.part_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::not_found("Part", item.part_id))?;
            if part.is_job_work {
                continue;
            }
            let lines = groups.entry(part.primary_supplier_id).or_insert_with(|| {
                supplier_order.push(part.primary_supplier_id);
                Vec::new()
            });
            lines.push((part.id, item.quantity, part.cost_price));
        }

        let order_date = Utc::now().date_naive();
        let mut created = Vec::with_capacity(supplier_order.len());
        for supplier_id in supplier_order {
            let lines = groups.remove(&supplier_id).unwrap_or_default();
            let detail = insert_purchase_order(
                &txn,
                supplier_id,
                Some(order.id),
                order_date,
                &settings.base_currency,
                lines,
            )
            .await?;
            created.push(detail);
        }

        let status_event = set_status(&txn, order, OrderStatus::PoReleased).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.purchase_orders.created", created.len() as u64);
        let purchase_order_ids: Vec<Uuid> = created.iter().map(|po| po.order.id).collect();
        info!(%sales_order_id, count = purchase_order_ids.len(), "Purchase orders raised from sales order");
        let event = Event::PurchaseOrdersReleased {
            sales_order_id,
            purchase_order_ids,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, %sales_order_id, "Failed to send purchase orders released event");
        }
        publish(&self.event_sender, status_event).await;

        Ok(created)
    }

    #[instrument(skip(self, request), fields(supplier_id = %request.supplier_id))]
    pub async fn create_purchase_order(
        &self,
        request: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderDetail, ServiceError> {
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

        let supplier = supplier::Entity::find_by_id(request.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Supplier", request.supplier_id))?;
        if !supplier.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Supplier {} is inactive",
                supplier.code
            )));
        }
        if let Some(so_id) = request.sales_order_id {
            find_sales_order(&txn, so_id).await?;
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let part = part::Entity::find_by_id(line.part_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::not_found("Part", line.part_id))?;
            lines.push((
                part.id,
                line.quantity,
                line.unit_price.unwrap_or(part.cost_price),
            ));
        }

        let settings = load_or_init(&txn).await?;
        let detail = insert_purchase_order(
            &txn,
            supplier.id,
            request.sales_order_id,
            request
                .order_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            &settings.base_currency,
            lines,
        )
        .await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.purchase_orders.created", 1);
        info!(purchase_order_id = %detail.order.id, number = %detail.order.number, "Purchase order created");
        if let Err(e) = self
            .event_sender
            .send(Event::PurchaseOrderCreated(detail.order.id))
            .await
        {
            warn!(error = %e, purchase_order_id = %detail.order.id, "Failed to send purchase order created event");
        }
        Ok(detail)
    }

    /// Pending Approval -> PO Released
    #[instrument(skip(self))]
    pub async fn approve_purchase_order(
        &self,
        id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db_pool;
        let order = find_purchase_order(db, id).await?;
        if order.status != OrderStatus::PendingApproval {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} is {} and not awaiting approval",
                order.number, order.status
            )));
        }

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(OrderStatus::PoReleased);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        counter!("scm.purchase_orders.approved", 1);
        info!(purchase_order_id = %id, "Purchase order approved");
        if let Err(e) = self.event_sender.send(Event::PurchaseOrderApproved(id)).await {
            warn!(error = %e, purchase_order_id = %id, "Failed to send purchase order approved event");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(&self, id: Uuid) -> Result<PurchaseOrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = find_purchase_order(db, id).await?;
        let items = load_lines(db, id).await?;
        Ok(PurchaseOrderDetail { order, items })
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        filter: PurchaseOrderFilter,
        page: PageRequest,
    ) -> Result<Page<purchase_order::Model>, ServiceError> {
        let mut query = purchase_order::Entity::find()
            .order_by_desc(purchase_order::Column::OrderDate)
            .order_by_desc(purchase_order::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        if let Some(sales_order_id) = filter.sales_order_id {
            query = query.filter(purchase_order::Column::SalesOrderId.eq(sales_order_id));
        }
        fetch_page(query, &*self.db_pool, page).await
    }
}

pub(crate) async fn find_purchase_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Purchase order", id))
}

/// Quantity received per part across every GRN of a purchase order
pub(crate) async fn received_by_part<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Uuid,
) -> Result<HashMap<Uuid, i32>, ServiceError> {
    let receipts = goods_receipt::Entity::find()
        .filter(goods_receipt::Column::PurchaseOrderId.eq(purchase_order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let receipt_ids: Vec<Uuid> = receipts.iter().map(|r| r.id).collect();
    if receipt_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let lines = goods_receipt_item::Entity::find()
        .filter(goods_receipt_item::Column::GoodsReceiptId.is_in(receipt_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let mut received = HashMap::new();
    for line in lines {
        *received.entry(line.part_id).or_insert(0) += line.quantity;
    }
    Ok(received)
}

/// Purchase order lines with received and outstanding quantities
pub(crate) async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Uuid,
) -> Result<Vec<PurchaseOrderLine>, ServiceError> {
    let items = purchase_order_item::Entity::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(purchase_order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let mut received = received_by_part(conn, purchase_order_id).await?;

    // received quantities are attributed to lines in order when a part repeats
    Ok(items
        .into_iter()
        .map(|item| {
            let available = received.entry(item.part_id).or_insert(0);
            let received_quantity = (*available).min(item.quantity);
            *available -= received_quantity;
            PurchaseOrderLine {
                balance_quantity: item.quantity - received_quantity,
                received_quantity,
                item,
            }
        })
        .collect())
}

async fn insert_purchase_order<C: ConnectionTrait>(
    conn: &C,
    supplier_id: Uuid,
    sales_order_id: Option<Uuid>,
    order_date: NaiveDate,
    currency: &str,
    lines: Vec<(Uuid, i32, Decimal)>,
) -> Result<PurchaseOrderDetail, ServiceError> {
    let total: Decimal = lines
        .iter()
        .map(|(_, qty, price)| *price * Decimal::from(*qty))
        .sum();
    let number = allocate_number(conn, DocumentKind::PurchaseOrder).await?;
    let now = Utc::now();

    let order = purchase_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        number: Set(number),
        supplier_id: Set(supplier_id),
        sales_order_id: Set(sales_order_id),
        order_date: Set(order_date),
        status: Set(OrderStatus::PendingApproval),
        total_amount: Set(total),
        currency: Set(currency.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    let mut items = Vec::with_capacity(lines.len());
    for (part_id, quantity, unit_price) in lines {
        let item = purchase_order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(order.id),
            part_id: Set(part_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;
        items.push(PurchaseOrderLine {
            received_quantity: 0,
            balance_quantity: item.quantity,
            item,
        });
    }

    Ok(PurchaseOrderDetail { order, items })
}
