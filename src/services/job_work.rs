use super::{
    fetch_page, format_code,
    parts::{find_part, load_route},
    receipts::add_stock,
    sales_orders::{find_sales_order, load_items, publish, set_status},
    settings::load_or_init,
    suppliers::lookup_process_price,
    Page, PageRequest,
};
use crate::{
    db::DbPool,
    entities::{
        job_work_order, part, process, sales_order, sales_order_item, supplier,
        supplier_process_price, JobWorkStatus, OrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
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
pub struct IssueJobWorkRequest {
    pub sales_order_id: Uuid,
    pub part_id: Uuid,
    pub supplier_id: Uuid,
    /// Defaults to the next stage of the part's route
    #[validate(range(min = 0))]
    pub process_index: Option<i32>,
    /// Defaults to the supplier's rate for the process
    pub unit_price: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub challan_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateJobWorkStatusRequest {
    pub status: JobWorkStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InwardJobWorkRequest {
    /// Return challan or subcontractor invoice reference
    #[validate(length(min = 1, message = "Inward reference is required"))]
    pub inward_reference: String,
    pub inwarded_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobWorkFilter {
    pub sales_order_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub status: Option<JobWorkStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuggestedSupplier {
    pub supplier_id: Uuid,
    pub supplier_code: String,
    pub supplier_name: String,
    pub price: Decimal,
}

/// A stage that is ready to be sent out
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingProcess {
    pub sales_order_id: Uuid,
    pub sales_order_number: String,
    pub sales_order_item_id: Uuid,
    pub part_id: Uuid,
    pub part_sku: String,
    pub part_name: String,
    pub process_index: i32,
    pub total_stages: i32,
    pub process_id: Uuid,
    pub process_name: String,
    pub quantity: i32,
    pub suggested_suppliers: Vec<SuggestedSupplier>,
}

#[derive(Clone)]
pub struct JobWorkService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl JobWorkService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Next unissued stage of every job-work line on open sales orders
    #[instrument(skip(self))]
    pub async fn pending_processes(&self) -> Result<Vec<PendingProcess>, ServiceError> {
        let db = &*self.db_pool;
        let orders = sales_order::Entity::find()
            .filter(
                sales_order::Column::Status
                    .is_not_in([OrderStatus::Completed, OrderStatus::Invoiced]),
            )
            .order_by_asc(sales_order::Column::OrderDate)
            .order_by_asc(sales_order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut parts: HashMap<Uuid, Option<(part::Model, Vec<Uuid>)>> = HashMap::new();
        let mut pending = Vec::new();
        for order in orders {
            let items = load_items(db, order.id).await?;
            let mut seen = HashSet::new();
            for item in &items {
                if !seen.insert(item.part_id) {
                    continue;
                }
                if !parts.contains_key(&item.part_id) {
                    let part = find_part(db, item.part_id).await?;
                    let entry = if part.is_job_work {
                        let route = load_route(db, part.id).await?;
                        (!route.is_empty()).then_some((part, route))
                    } else {
                        None
                    };
                    parts.insert(item.part_id, entry);
                }
                let Some(Some((part, route))) = parts.get(&item.part_id) else {
                    continue;
                };

                let lines: Vec<&sales_order_item::Model> =
                    items.iter().filter(|i| i.part_id == item.part_id).collect();
                let next = lines
                    .iter()
                    .map(|i| i.next_stage())
                    .min()
                    .unwrap_or_else(|| item.next_stage());
                if next < 0 || next as usize >= route.len() {
                    continue;
                }
                if open_order_for_stage(db, order.id, part.id, next).await?.is_some() {
                    continue;
                }

                let process_id = route[next as usize];
                let process_name = process::Entity::find_by_id(process_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?
                    .map(|p| p.name)
                    .unwrap_or_default();

                pending.push(PendingProcess {
                    sales_order_id: order.id,
                    sales_order_number: order.number.clone(),
                    sales_order_item_id: item.id,
                    part_id: part.id,
                    part_sku: part.sku.clone(),
                    part_name: part.name.clone(),
                    process_index: next,
                    total_stages: route.len() as i32,
                    process_id,
                    process_name,
                    quantity: lines.iter().map(|i| i.quantity).sum(),
                    suggested_suppliers: suggested_suppliers(db, process_id).await?,
                });
            }
        }
        Ok(pending)
    }

    /// Sends a part out for the next stage of its route
    #[instrument(skip(self, request), fields(sales_order_id = %request.sales_order_id, part_id = %request.part_id))]
    pub async fn issue_job_work(
        &self,
        request: IssueJobWorkRequest,
    ) -> Result<job_work_order::Model, ServiceError> {
        request.validate()?;
        if matches!(request.unit_price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Unit price cannot be negative".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let order = find_sales_order(&txn, request.sales_order_id).await?;
        if matches!(order.status, OrderStatus::Completed | OrderStatus::Invoiced) {
            return Err(ServiceError::InvalidOperation(format!(
                "Sales order {} is {}; job work can no longer be issued",
                order.number, order.status
            )));
        }
        let part = find_part(&txn, request.part_id).await?;
        if !part.is_job_work {
            return Err(ServiceError::InvalidOperation(format!(
                "Part {} is not a job-work part",
                part.sku
            )));
        }
        let route = load_route(&txn, part.id).await?;
        // Lines repeating the same part travel through the route as one batch
        let lines: Vec<sales_order_item::Model> = load_items(&txn, order.id)
            .await?
            .into_iter()
            .filter(|i| i.part_id == part.id)
            .collect();
        let completed = lines
            .iter()
            .map(|i| i.completed_process_index)
            .min()
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "Part {} is not on sales order {}",
                    part.sku, order.number
                ))
            })?;
        let quantity: i32 = lines.iter().map(|i| i.quantity).sum();

        let stage = request.process_index.unwrap_or(completed + 1);
        check_stage(stage, completed, route.len())?;
        if let Some(open) = open_order_for_stage(&txn, order.id, part.id, stage).await? {
            return Err(ServiceError::InvalidOperation(format!(
                "Stage {} of part {} is already issued on {}",
                stage + 1,
                part.sku,
                open.number
            )));
        }
        if stage > 0 && !stage_inwarded(&txn, order.id, part.id, stage - 1).await? {
            return Err(ServiceError::InvalidOperation(format!(
                "Stage {} of part {} must be inwarded first",
                stage,
                part.sku
            )));
        }

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

        let process_id = route[stage as usize];
        let unit_price = match request.unit_price {
            Some(price) => price,
            None => lookup_process_price(&txn, supplier.id, process_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidInput(format!(
                        "Supplier {} has no price for this process; provide a unit price",
                        supplier.code
                    ))
                })?,
        };

        let settings = load_or_init(&txn).await?;
        let sequence = job_work_order::Entity::find()
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?
            + 1;
        let now = Utc::now();
        let jwo = job_work_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(format_code("JW-", sequence, 6)),
            linked_po_number: Set(format_code("JW-PO-", sequence, 6)),
            supplier_id: Set(supplier.id),
            part_id: Set(part.id),
            process_id: Set(process_id),
            sales_order_id: Set(order.id),
            process_index: Set(stage),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            total_price: Set(unit_price * Decimal::from(quantity)),
            currency: Set(settings.base_currency),
            order_date: Set(request.order_date.unwrap_or_else(|| now.date_naive())),
            expected_date: Set(request.expected_date),
            challan_number: Set(request.challan_number),
            inward_reference: Set(None),
            inwarded_date: Set(None),
            status: Set(JobWorkStatus::Issued),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.job_work.issued", 1);
        info!(job_work_order_id = %jwo.id, number = %jwo.number, stage, "Job work issued");
        let event = Event::JobWorkIssued {
            job_work_order_id: jwo.id,
            sales_order_id: jwo.sales_order_id,
            process_index: stage,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, job_work_order_id = %jwo.id, "Failed to send job work issued event");
        }
        Ok(jwo)
    }

    /// Tracks progress at the subcontractor; inwarding has its own operation
    #[instrument(skip(self, request), fields(status = %request.status))]
    pub async fn update_job_work_status(
        &self,
        id: Uuid,
        request: UpdateJobWorkStatusRequest,
    ) -> Result<job_work_order::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = find_job_work_order(db, id).await?;
        if existing.status == JobWorkStatus::Inwarded {
            return Err(ServiceError::InvalidOperation(format!(
                "Job work order {} is already inwarded",
                existing.number
            )));
        }
        if request.status == JobWorkStatus::Inwarded {
            return Err(ServiceError::InvalidStatus(
                "Use the inward operation to mark job work as Inwarded".to_string(),
            ));
        }

        let mut active: job_work_order::ActiveModel = existing.into();
        active.status = Set(request.status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        let event = Event::JobWorkStatusChanged {
            job_work_order_id: id,
            new_status: updated.status.to_string(),
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, job_work_order_id = %id, "Failed to send job work status event");
        }
        Ok(updated)
    }

    /// Receives processed material back and advances the line's completed stage
    #[instrument(skip(self, request))]
    pub async fn inward_job_work(
        &self,
        id: Uuid,
        request: InwardJobWorkRequest,
    ) -> Result<job_work_order::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let jwo = find_job_work_order(&txn, id).await?;
        if jwo.status == JobWorkStatus::Inwarded {
            return Err(ServiceError::InvalidOperation(format!(
                "Job work order {} is already inwarded",
                jwo.number
            )));
        }

        let route = load_route(&txn, jwo.part_id).await?;
        let final_stage = jwo.process_index as usize + 1 >= route.len();
        let items = load_items(&txn, jwo.sales_order_id).await?;
        let behind = items
            .into_iter()
            .filter(|i| i.part_id == jwo.part_id && i.completed_process_index < jwo.process_index);
        for item in behind {
            let mut active: sales_order_item::ActiveModel = item.into();
            active.completed_process_index = Set(jwo.process_index);
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        let quantity = jwo.quantity;
        let part_id = jwo.part_id;
        let sales_order_id = jwo.sales_order_id;
        let mut active: job_work_order::ActiveModel = jwo.into();
        active.status = Set(JobWorkStatus::Inwarded);
        active.inward_reference = Set(Some(request.inward_reference.trim().to_string()));
        active.inwarded_date = Set(Some(
            request
                .inwarded_date
                .unwrap_or_else(|| Utc::now().date_naive()),
        ));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let mut status_event = None;
        if final_stage {
            add_stock(&txn, part_id, quantity).await?;
            if job_work_complete(&txn, sales_order_id).await? {
                let order = find_sales_order(&txn, sales_order_id).await?;
                if matches!(
                    order.status,
                    OrderStatus::Confirmed
                        | OrderStatus::PoReleased
                        | OrderStatus::Purchased
                        | OrderStatus::PartiallyReceived
                ) {
                    status_event = set_status(&txn, order, OrderStatus::Received).await?;
                }
            }
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.job_work.inwarded", 1, "final_stage" => final_stage.to_string());
        info!(job_work_order_id = %id, final_stage, "Job work inwarded");
        let event = Event::JobWorkInwarded {
            job_work_order_id: id,
            final_stage,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, job_work_order_id = %id, "Failed to send job work inwarded event");
        }
        publish(&self.event_sender, status_event).await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_job_work_orders(
        &self,
        filter: JobWorkFilter,
        page: PageRequest,
    ) -> Result<Page<job_work_order::Model>, ServiceError> {
        let mut query = job_work_order::Entity::find()
            .order_by_desc(job_work_order::Column::OrderDate)
            .order_by_desc(job_work_order::Column::CreatedAt);
        if let Some(so_id) = filter.sales_order_id {
            query = query.filter(job_work_order::Column::SalesOrderId.eq(so_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(job_work_order::Column::SupplierId.eq(supplier_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(job_work_order::Column::Status.eq(status));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self))]
    pub async fn get_job_work_order(
        &self,
        id: Uuid,
    ) -> Result<job_work_order::Model, ServiceError> {
        find_job_work_order(&*self.db_pool, id).await
    }
}

/// Stage gating: only the stage right after the last completed one may be issued
fn check_stage(stage: i32, completed: i32, stages: usize) -> Result<(), ServiceError> {
    if stage < 0 || stage as usize >= stages {
        return Err(ServiceError::InvalidInput(format!(
            "Process index {} is outside the part's {} stage route",
            stage, stages
        )));
    }
    if stage != completed + 1 {
        return Err(ServiceError::InvalidOperation(format!(
            "Stage {} cannot be issued; next stage is {}",
            stage,
            completed + 1
        )));
    }
    Ok(())
}

async fn find_job_work_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<job_work_order::Model, ServiceError> {
    job_work_order::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Job work order", id))
}

async fn open_order_for_stage<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
    part_id: Uuid,
    stage: i32,
) -> Result<Option<job_work_order::Model>, ServiceError> {
    job_work_order::Entity::find()
        .filter(job_work_order::Column::SalesOrderId.eq(sales_order_id))
        .filter(job_work_order::Column::PartId.eq(part_id))
        .filter(job_work_order::Column::ProcessIndex.eq(stage))
        .filter(job_work_order::Column::Status.ne(JobWorkStatus::Inwarded))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn stage_inwarded<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
    part_id: Uuid,
    stage: i32,
) -> Result<bool, ServiceError> {
    let count = job_work_order::Entity::find()
        .filter(job_work_order::Column::SalesOrderId.eq(sales_order_id))
        .filter(job_work_order::Column::PartId.eq(part_id))
        .filter(job_work_order::Column::ProcessIndex.eq(stage))
        .filter(job_work_order::Column::Status.eq(JobWorkStatus::Inwarded))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(count > 0)
}

/// Whether every job-work line of the order has finished its last stage
async fn job_work_complete<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<bool, ServiceError> {
    for item in load_items(conn, sales_order_id).await? {
        let part = find_part(conn, item.part_id).await?;
        if !part.is_job_work {
            continue;
        }
        let stages = load_route(conn, part.id).await?.len() as i32;
        if item.completed_process_index < stages - 1 {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn suggested_suppliers<C: ConnectionTrait>(
    conn: &C,
    process_id: Uuid,
) -> Result<Vec<SuggestedSupplier>, ServiceError> {
    let prices = supplier_process_price::Entity::find()
        .filter(supplier_process_price::Column::ProcessId.eq(process_id))
        .order_by_asc(supplier_process_price::Column::Price)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut suggestions = Vec::with_capacity(prices.len());
    for price in prices {
        let supplier = supplier::Entity::find_by_id(price.supplier_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if let Some(supplier) = supplier.filter(|s| s.is_active) {
            suggestions.push(SuggestedSupplier {
                supplier_id: supplier.id,
                supplier_code: supplier.code,
                supplier_name: supplier.name,
                price: price.price,
            });
        }
    }
    Ok(suggestions)
}
