use super::{
    fetch_page,
    parts::load_route,
    purchase_orders::{find_purchase_order, received_by_part},
    receipts::add_stock,
    sales_orders::{find_sales_order, load_items, publish, set_status},
    settings::{allocate_number, DocumentKind},
    Page, PageRequest,
};
use crate::{
    db::DbPool,
    entities::{
        customer, customer_invoice, customer_invoice_item, job_work_order, purchase_order,
        sales_order_item, supplier, supplier_invoice, JobWorkStatus, OrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SupplierInvoiceRequest {
    pub purchase_order_id: Uuid,
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    /// Defaults to today
    pub invoice_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JobWorkInvoiceRequest {
    pub job_work_order_id: Uuid,
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InvoiceLineInput {
    pub part_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerInvoiceRequest {
    pub sales_order_id: Uuid,
    pub invoice_date: Option<NaiveDate>,
    /// Invoices every available quantity when absent
    pub items: Option<Vec<InvoiceLineInput>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerInvoiceFilter {
    pub sales_order_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplierInvoiceFilter {
    pub supplier_id: Option<Uuid>,
}

/// How much of a sales order line can be billed right now
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceableLine {
    pub sales_order_item_id: Uuid,
    pub part_id: Uuid,
    pub ordered_quantity: i32,
    pub invoiced_quantity: i32,
    pub received_quantity: i32,
    pub available_quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerInvoiceDetail {
    #[serde(flatten)]
    pub invoice: customer_invoice::Model,
    pub items: Vec<customer_invoice_item::Model>,
}

#[derive(Clone)]
pub struct InvoicingService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InvoicingService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records the supplier's bill for a received purchase order
    #[instrument(skip(self, request), fields(purchase_order_id = %request.purchase_order_id))]
    pub async fn process_supplier_invoice(
        &self,
        request: SupplierInvoiceRequest,
    ) -> Result<supplier_invoice::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let order = find_purchase_order(&txn, request.purchase_order_id).await?;
        if !matches!(
            order.status,
            OrderStatus::Received | OrderStatus::PartiallyReceived
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} is {} and cannot be invoiced",
                order.number, order.status
            )));
        }
        let already = supplier_invoice::Entity::find()
            .filter(supplier_invoice::Column::PurchaseOrderId.eq(order.id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if already > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} is already invoiced",
                order.number
            )));
        }

        let supplier = find_supplier(&txn, order.supplier_id).await?;
        let invoice_date = request
            .invoice_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let invoice = supplier_invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(request.invoice_number.trim().to_string()),
            supplier_id: Set(supplier.id),
            purchase_order_id: Set(Some(order.id)),
            job_work_order_id: Set(None),
            amount: Set(order.total_amount),
            currency: Set(order.currency.clone()),
            invoice_date: Set(invoice_date),
            due_date: Set(due_date(invoice_date, supplier.credit_period)),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Invoiced);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.supplier_invoices.recorded", 1, "source" => "purchase_order");
        info!(invoice_id = %invoice.id, amount = %invoice.amount, "Supplier invoice recorded");
        self.announce_supplier_invoice(&invoice).await;
        Ok(invoice)
    }

    /// Records the subcontractor's bill for an inwarded job-work order
    #[instrument(skip(self, request), fields(job_work_order_id = %request.job_work_order_id))]
    pub async fn process_job_work_invoice(
        &self,
        request: JobWorkInvoiceRequest,
    ) -> Result<supplier_invoice::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let order = job_work_order::Entity::find_by_id(request.job_work_order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Job work order", request.job_work_order_id))?;
        if order.status != JobWorkStatus::Inwarded {
            return Err(ServiceError::InvalidOperation(format!(
                "Job work order {} is {} and cannot be invoiced before inward",
                order.number, order.status
            )));
        }
        let already = supplier_invoice::Entity::find()
            .filter(supplier_invoice::Column::JobWorkOrderId.eq(order.id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if already > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Job work order {} is already invoiced",
                order.number
            )));
        }

        let supplier = find_supplier(&txn, order.supplier_id).await?;
        let invoice_date = request
            .invoice_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let invoice = supplier_invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(request.invoice_number.trim().to_string()),
            supplier_id: Set(supplier.id),
            purchase_order_id: Set(None),
            job_work_order_id: Set(Some(order.id)),
            amount: Set(order.total_price),
            currency: Set(order.currency.clone()),
            invoice_date: Set(invoice_date),
            due_date: Set(due_date(invoice_date, supplier.credit_period)),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.supplier_invoices.recorded", 1, "source" => "job_work");
        info!(invoice_id = %invoice.id, amount = %invoice.amount, "Job work invoice recorded");
        self.announce_supplier_invoice(&invoice).await;
        Ok(invoice)
    }

    /// Inwarded job-work orders still waiting for the subcontractor's bill
    #[instrument(skip(self))]
    pub async fn pending_job_work_invoices(
        &self,
    ) -> Result<Vec<job_work_order::Model>, ServiceError> {
        let db = &*self.db_pool;
        let billed: HashSet<Uuid> = supplier_invoice::Entity::find()
            .filter(supplier_invoice::Column::JobWorkOrderId.is_not_null())
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .filter_map(|inv| inv.job_work_order_id)
            .collect();

        Ok(job_work_order::Entity::find()
            .filter(job_work_order::Column::Status.eq(JobWorkStatus::Inwarded))
            .order_by_asc(job_work_order::Column::Number)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .filter(|jwo| !billed.contains(&jwo.id))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_supplier_invoices(
        &self,
        filter: SupplierInvoiceFilter,
        page: PageRequest,
    ) -> Result<Page<supplier_invoice::Model>, ServiceError> {
        let mut query = supplier_invoice::Entity::find()
            .order_by_desc(supplier_invoice::Column::InvoiceDate)
            .order_by_desc(supplier_invoice::Column::CreatedAt);
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(supplier_invoice::Column::SupplierId.eq(supplier_id));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    /// Preview of what `process_customer_invoice` could bill for a sales order
    #[instrument(skip(self))]
    pub async fn invoiceable_lines(
        &self,
        sales_order_id: Uuid,
    ) -> Result<Vec<InvoiceableLine>, ServiceError> {
        let db = &*self.db_pool;
        find_sales_order(db, sales_order_id).await?;
        let items = load_items(db, sales_order_id).await?;
        compute_invoiceable(db, sales_order_id, &items).await
    }

    /// Bills received quantities to the customer and ships them out of stock
    #[instrument(skip(self, request), fields(sales_order_id = %request.sales_order_id))]
    pub async fn process_customer_invoice(
        &self,
        request: CustomerInvoiceRequest,
    ) -> Result<CustomerInvoiceDetail, ServiceError> {
        if let Some(ref lines) = request.items {
            for line in lines {
                line.validate()?;
            }
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let order = find_sales_order(&txn, request.sales_order_id).await?;
        if matches!(order.status, OrderStatus::Confirmed | OrderStatus::Completed) {
            return Err(ServiceError::InvalidOperation(format!(
                "Sales order {} is {} and cannot be invoiced",
                order.number, order.status
            )));
        }

        let items = load_items(&txn, order.id).await?;
        let availability = compute_invoiceable(&txn, order.id, &items).await?;
        let billed = select_quantities(&availability, request.items.as_deref());
        if billed.iter().all(|(_, qty)| *qty == 0) {
            return Err(ServiceError::InvalidOperation(format!(
                "Nothing is available to invoice on sales order {}",
                order.number
            )));
        }

        let customer = customer::Entity::find_by_id(order.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer", order.customer_id))?;

        let amount: Decimal = billed
            .iter()
            .map(|(line, qty)| line.unit_price * Decimal::from(*qty))
            .sum();
        let invoice_date = request
            .invoice_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let number = allocate_number(&txn, DocumentKind::CustomerInvoice).await?;
        let invoice = customer_invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number),
            sales_order_id: Set(order.id),
            customer_id: Set(customer.id),
            amount: Set(amount),
            currency: Set(order.currency.clone()),
            invoice_date: Set(invoice_date),
            due_date: Set(due_date(invoice_date, customer.credit_period)),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut invoice_items = Vec::new();
        let mut invoiced_by_item: HashMap<Uuid, i32> = HashMap::new();
        for (line, qty) in billed.iter().filter(|(_, qty)| *qty > 0) {
            let item = customer_invoice_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_invoice_id: Set(invoice.id),
                part_id: Set(line.part_id),
                quantity: Set(*qty),
                unit_price: Set(line.unit_price),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            invoice_items.push(item);
            add_stock(&txn, line.part_id, -*qty).await?;
            invoiced_by_item.insert(line.sales_order_item_id, *qty);
        }

        let mut fully_invoiced = true;
        for item in items {
            let added = invoiced_by_item.get(&item.id).copied().unwrap_or(0);
            let invoiced = item.invoiced_quantity + added;
            if invoiced < item.quantity {
                fully_invoiced = false;
            }
            if added > 0 {
                let mut active: sales_order_item::ActiveModel = item.into();
                active.invoiced_quantity = Set(invoiced);
                active.update(&txn).await.map_err(ServiceError::db_error)?;
            }
        }

        let next_status = if fully_invoiced {
            OrderStatus::Completed
        } else {
            OrderStatus::Invoiced
        };
        let status_event = set_status(&txn, order, next_status).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.customer_invoices.issued", 1);
        info!(invoice_id = %invoice.id, number = %invoice.number, amount = %invoice.amount, "Customer invoice issued");
        let event = Event::CustomerInvoiceIssued {
            invoice_id: invoice.id,
            sales_order_id: invoice.sales_order_id,
            amount: invoice.amount,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, invoice_id = %invoice.id, "Failed to send customer invoice event");
        }
        publish(&self.event_sender, status_event).await;

        Ok(CustomerInvoiceDetail {
            invoice,
            items: invoice_items,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_customer_invoices(
        &self,
        filter: CustomerInvoiceFilter,
        page: PageRequest,
    ) -> Result<Page<customer_invoice::Model>, ServiceError> {
        let mut query = customer_invoice::Entity::find()
            .order_by_desc(customer_invoice::Column::InvoiceDate)
            .order_by_desc(customer_invoice::Column::CreatedAt);
        if let Some(so_id) = filter.sales_order_id {
            query = query.filter(customer_invoice::Column::SalesOrderId.eq(so_id));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(customer_invoice::Column::CustomerId.eq(customer_id));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self))]
    pub async fn get_customer_invoice(
        &self,
        id: Uuid,
    ) -> Result<CustomerInvoiceDetail, ServiceError> {
        let db = &*self.db_pool;
        let invoice = customer_invoice::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer invoice", id))?;
        let items = customer_invoice_item::Entity::find()
            .filter(customer_invoice_item::Column::CustomerInvoiceId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(CustomerInvoiceDetail { invoice, items })
    }

    async fn announce_supplier_invoice(&self, invoice: &supplier_invoice::Model) {
        let event = Event::SupplierInvoiceRecorded {
            invoice_id: invoice.id,
            amount: invoice.amount,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, invoice_id = %invoice.id, "Failed to send supplier invoice event");
        }
    }
}

fn due_date(invoice_date: NaiveDate, credit_period_days: i32) -> NaiveDate {
    invoice_date + Duration::days(i64::from(credit_period_days))
}

async fn find_supplier<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<supplier::Model, ServiceError> {
    supplier::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Supplier", id))
}

/// Quantity physically available to bill per part on a sales order: GRN receipts on its
/// purchase orders plus final-stage job-work inwards
async fn received_for_sales_order<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<HashMap<Uuid, i32>, ServiceError> {
    let mut received: HashMap<Uuid, i32> = HashMap::new();

    let orders = purchase_order::Entity::find()
        .filter(purchase_order::Column::SalesOrderId.eq(sales_order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    for order in orders {
        for (part_id, qty) in received_by_part(conn, order.id).await? {
            *received.entry(part_id).or_insert(0) += qty;
        }
    }

    let inwarded = job_work_order::Entity::find()
        .filter(job_work_order::Column::SalesOrderId.eq(sales_order_id))
        .filter(job_work_order::Column::Status.eq(JobWorkStatus::Inwarded))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let mut route_lengths: HashMap<Uuid, usize> = HashMap::new();
    for jwo in inwarded {
        let stages = match route_lengths.get(&jwo.part_id) {
            Some(len) => *len,
            None => {
                let len = load_route(conn, jwo.part_id).await?.len();
                route_lengths.insert(jwo.part_id, len);
                len
            }
        };
        if stages > 0 && jwo.process_index as usize == stages - 1 {
            *received.entry(jwo.part_id).or_insert(0) += jwo.quantity;
        }
    }

    Ok(received)
}

async fn compute_invoiceable<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
    items: &[sales_order_item::Model],
) -> Result<Vec<InvoiceableLine>, ServiceError> {
    let mut received = received_for_sales_order(conn, sales_order_id).await?;
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        // a part that repeats on the order consumes receipts line by line
        let pool = received.entry(item.part_id).or_insert(0);
        let line_received = (*pool).min(item.quantity);
        *pool -= line_received;
        lines.push(InvoiceableLine {
            sales_order_item_id: item.id,
            part_id: item.part_id,
            ordered_quantity: item.quantity,
            invoiced_quantity: item.invoiced_quantity,
            received_quantity: line_received,
            available_quantity: available_quantity(
                item.quantity,
                item.invoiced_quantity,
                line_received,
            ),
            unit_price: item.unit_price,
        });
    }
    Ok(lines)
}

fn available_quantity(ordered: i32, invoiced: i32, received: i32) -> i32 {
    (ordered - invoiced).min(received - invoiced).max(0)
}

/// Pairs each line with the quantity to bill, capping requests at availability
fn select_quantities<'a>(
    lines: &'a [InvoiceableLine],
    requested: Option<&[InvoiceLineInput]>,
) -> Vec<(&'a InvoiceableLine, i32)> {
    let Some(requested) = requested else {
        return lines.iter().map(|l| (l, l.available_quantity)).collect();
    };

    let mut wanted: HashMap<Uuid, i32> = HashMap::new();
    for line in requested {
        let total = wanted.entry(line.part_id).or_insert(0);
        *total = total.saturating_add(line.quantity);
    }
    lines
        .iter()
        .map(|line| {
            let remaining = wanted.entry(line.part_id).or_insert(0);
            let qty = (*remaining).min(line.available_quantity).max(0);
            *remaining -= qty;
            (line, qty)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(part_id: Uuid, available: i32) -> InvoiceableLine {
        InvoiceableLine {
            sales_order_item_id: Uuid::new_v4(),
            part_id,
            ordered_quantity: 10,
            invoiced_quantity: 0,
            received_quantity: available,
            available_quantity: available,
            unit_price: Decimal::ONE,
        }
    }

    #[rstest]
    #[case(10, 0, 10, 10)]
    #[case(10, 0, 4, 4)]
    #[case(10, 4, 10, 6)]
    #[case(10, 4, 4, 0)]
    #[case(10, 6, 4, 0)]
    fn available_is_bounded_by_order_and_receipts(
        #[case] ordered: i32,
        #[case] invoiced: i32,
        #[case] received: i32,
        #[case] expected: i32,
    ) {
        assert_eq!(available_quantity(ordered, invoiced, received), expected);
    }

    #[test]
    fn oversized_requests_for_one_part_saturate() {
        let part = Uuid::new_v4();
        let lines = vec![line(part, 4), line(part, 2)];
        let request = vec![
            InvoiceLineInput {
                part_id: part,
                quantity: i32::MAX,
            },
            InvoiceLineInput {
                part_id: part,
                quantity: 1,
            },
        ];
        let picked = select_quantities(&lines, Some(&request));
        assert_eq!(picked[0].1, 4);
        assert_eq!(picked[1].1, 2);
    }

    #[test]
    fn requested_quantities_are_capped() {
        let part = Uuid::new_v4();
        let lines = vec![line(part, 3)];
        let request = vec![InvoiceLineInput {
            part_id: part,
            quantity: 8,
        }];
        let picked = select_quantities(&lines, Some(&request));
        assert_eq!(picked[0].1, 3);
    }

    #[test]
    fn no_request_bills_everything_available() {
        let lines = vec![line(Uuid::new_v4(), 2), line(Uuid::new_v4(), 5)];
        let picked: Vec<i32> = select_quantities(&lines, None)
            .into_iter()
            .map(|(_, q)| q)
            .collect();
        assert_eq!(picked, vec![2, 5]);
    }

    #[test]
    fn unrequested_parts_are_skipped() {
        let billed = Uuid::new_v4();
        let lines = vec![line(billed, 4), line(Uuid::new_v4(), 4)];
        let request = vec![InvoiceLineInput {
            part_id: billed,
            quantity: 1,
        }];
        let picked: Vec<i32> = select_quantities(&lines, Some(&request))
            .into_iter()
            .map(|(_, q)| q)
            .collect();
        assert_eq!(picked, vec![1, 0]);
    }

    #[test]
    fn due_date_adds_credit_days() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            due_date(date, 30),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
