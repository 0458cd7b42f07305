use super::{
    fetch_page,
    purchase_orders::{find_purchase_order, load_lines},
    sales_orders::{find_sales_order, publish, set_status},
    sequential_code, Page, PageRequest,
};
use crate::{
    db::DbPool,
    entities::{goods_receipt, goods_receipt_item, part, purchase_order, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptLineInput {
    pub part_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProcessGrnRequest {
    pub purchase_order_id: Uuid,
    #[validate(length(min = 1, message = "Supplier invoice number is required"))]
    pub supplier_invoice_number: String,
    /// Defaults to today
    pub received_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "At least one received line is required"))]
    pub items: Vec<ReceiptLineInput>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReceiptFilter {
    pub purchase_order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoodsReceiptDetail {
    #[serde(flatten)]
    pub receipt: goods_receipt::Model,
    pub items: Vec<goods_receipt_item::Model>,
}

#[derive(Clone)]
pub struct ReceiptService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ReceiptService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Books inbound stock against a released purchase order
    #[instrument(skip(self, request), fields(purchase_order_id = %request.purchase_order_id))]
    pub async fn process_grn(
        &self,
        request: ProcessGrnRequest,
    ) -> Result<GoodsReceiptDetail, ServiceError> {
        request.validate()?;
        for line in &request.items {
            line.validate()?;
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let order = find_purchase_order(&txn, request.purchase_order_id).await?;
        if !order.status.accepts_receipts() {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} is {} and cannot receive goods",
                order.number, order.status
            )));
        }

        let mut balances: HashMap<Uuid, i32> = HashMap::new();
        for line in load_lines(&txn, order.id).await? {
            *balances.entry(line.item.part_id).or_insert(0) += line.balance_quantity;
        }

        let mut accepted: Vec<(Uuid, i32)> = Vec::new();
        for line in &request.items {
            let balance = balances.entry(line.part_id).or_insert(0);
            let effective = line.quantity.min(*balance);
            if effective < line.quantity {
                debug!(part_id = %line.part_id, requested = line.quantity, effective, "Receipt capped at open balance");
            }
            if effective > 0 {
                *balance -= effective;
                accepted.push((line.part_id, effective));
            }
        }
        if accepted.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "Nothing left to receive on purchase order {}",
                order.number
            )));
        }

        let number = sequential_code(goods_receipt::Entity::find(), &txn, "GRN-", 6).await?;
        let receipt = goods_receipt::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number),
            purchase_order_id: Set(order.id),
            supplier_invoice_number: Set(request.supplier_invoice_number.trim().to_string()),
            received_date: Set(request
                .received_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(accepted.len());
        for (part_id, quantity) in &accepted {
            let item = goods_receipt_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                goods_receipt_id: Set(receipt.id),
                part_id: Set(*part_id),
                quantity: Set(*quantity),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(item);

            add_stock(&txn, *part_id, *quantity).await?;
        }

        let fully_received = balances.values().all(|b| *b == 0);
        let po_status = if fully_received {
            OrderStatus::Received
        } else {
            OrderStatus::PartiallyReceived
        };
        let sales_order_id = order.sales_order_id;
        let purchase_order_id = order.id;
        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(po_status);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(ServiceError::db_error)?;

        let mut status_event = None;
        if let Some(so_id) = sales_order_id {
            if all_orders_received(&txn, so_id).await? {
                let sales_order = find_sales_order(&txn, so_id).await?;
                if matches!(
                    sales_order.status,
                    OrderStatus::PoReleased | OrderStatus::Purchased
                ) {
                    status_event = set_status(&txn, sales_order, OrderStatus::Received).await?;
                }
            }
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        let total_quantity: i32 = accepted.iter().map(|(_, q)| *q).sum();
        counter!("scm.receipts.processed", 1);
        info!(receipt_id = %receipt.id, number = %receipt.number, total_quantity, status = %po_status, "Goods received");
        let event = Event::GoodsReceived {
            receipt_id: receipt.id,
            purchase_order_id,
            total_quantity,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, receipt_id = %receipt.id, "Failed to send goods received event");
        }
        publish(&self.event_sender, status_event).await;

        Ok(GoodsReceiptDetail { receipt, items })
    }

    #[instrument(skip(self))]
    pub async fn list_grns(
        &self,
        filter: ReceiptFilter,
        page: PageRequest,
    ) -> Result<Page<goods_receipt::Model>, ServiceError> {
        let mut query = goods_receipt::Entity::find()
            .order_by_desc(goods_receipt::Column::ReceivedDate)
            .order_by_desc(goods_receipt::Column::CreatedAt);
        if let Some(po_id) = filter.purchase_order_id {
            query = query.filter(goods_receipt::Column::PurchaseOrderId.eq(po_id));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self))]
    pub async fn get_grn(&self, id: Uuid) -> Result<GoodsReceiptDetail, ServiceError> {
        let db = &*self.db_pool;
        let receipt = goods_receipt::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Goods receipt", id))?;
        let items = goods_receipt_item::Entity::find()
            .filter(goods_receipt_item::Column::GoodsReceiptId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(GoodsReceiptDetail { receipt, items })
    }
}

/// Increments on-hand stock for a part
pub(crate) async fn add_stock<C: ConnectionTrait>(
    conn: &C,
    part_id: Uuid,
    quantity: i32,
) -> Result<part::Model, ServiceError> {
    let part = part::Entity::find_by_id(part_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Part", part_id))?;
    let stock = part.stock + quantity;
    if stock < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "Part {} has {} on hand, {} requested",
            part.sku,
            part.stock,
            -quantity
        )));
    }
    let mut active: part::ActiveModel = part.into();
    active.stock = Set(stock);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(ServiceError::db_error)
}

async fn all_orders_received<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<bool, ServiceError> {
    let orders = purchase_order::Entity::find()
        .filter(purchase_order::Column::SalesOrderId.eq(sales_order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    for order in orders {
        let lines = load_lines(conn, order.id).await?;
        if lines.iter().any(|line| line.balance_quantity > 0) {
            return Ok(false);
        }
    }
    Ok(true)
}
