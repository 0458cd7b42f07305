use super::{fetch_page, sequential_code, Page, PageRequest};
use crate::{
    db::DbPool,
    entities::{
        customer, part, part_price_history, part_process, process, purchase_order,
        purchase_order_item, sales_order, sales_order_item, supplier, ManufacturingCondition,
        OrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePartRequest {
    #[validate(length(min = 1))]
    pub drawing_number: String,
    #[validate(length(min = 1, message = "Part name is required"))]
    pub name: String,
    #[validate(length(min = 1))]
    pub revision: String,
    pub description: Option<String>,
    pub customer_id: Uuid,
    pub primary_supplier_id: Uuid,
    pub secondary_supplier_id: Option<Uuid>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub is_job_work: bool,
    /// Ordered process ids; required for job-work parts
    #[serde(default)]
    pub required_processes: Vec<Uuid>,
    pub manufacturing_condition: ManufacturingCondition,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub lead_time_days: i32,
    #[serde(default = "default_moq")]
    #[validate(range(min = 1))]
    pub moq: i32,
    #[serde(default = "default_uom")]
    pub uom: String,
}

fn default_moq() -> i32 {
    1
}

fn default_uom() -> String {
    "Nos".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePartRequest {
    pub drawing_number: Option<String>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub revision: Option<String>,
    pub description: Option<String>,
    pub primary_supplier_id: Option<Uuid>,
    pub secondary_supplier_id: Option<Uuid>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_job_work: Option<bool>,
    /// Replaces the whole route when present
    pub required_processes: Option<Vec<Uuid>>,
    pub manufacturing_condition: Option<ManufacturingCondition>,
    #[validate(range(min = 0))]
    pub lead_time_days: Option<i32>,
    #[validate(range(min = 1))]
    pub moq: Option<i32>,
    pub uom: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PartFilter {
    pub active: Option<bool>,
    pub customer_id: Option<Uuid>,
    pub job_work: Option<bool>,
}

/// A part with its process route and pricing trail
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartDetail {
    #[serde(flatten)]
    pub part: part::Model,
    pub required_processes: Vec<Uuid>,
    pub price_history: Vec<part_price_history::Model>,
}

#[derive(Clone)]
pub struct PartService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PartService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_part(&self, request: CreatePartRequest) -> Result<PartDetail, ServiceError> {
        request.validate()?;
        ensure_non_negative_prices(request.cost_price, request.selling_price)?;
        if request.is_job_work && request.required_processes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Job-work parts need at least one required process".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        ensure_exists::<customer::Entity, _>(&txn, request.customer_id, "Customer").await?;
        ensure_exists::<supplier::Entity, _>(&txn, request.primary_supplier_id, "Supplier").await?;
        if let Some(secondary) = request.secondary_supplier_id {
            ensure_exists::<supplier::Entity, _>(&txn, secondary, "Supplier").await?;
        }

        let sku = sequential_code(part::Entity::find(), &txn, "GKP-", 6).await?;
        let now = Utc::now();
        let model = part::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku),
            drawing_number: Set(request.drawing_number),
            name: Set(request.name.trim().to_string()),
            revision: Set(request.revision),
            description: Set(request.description),
            customer_id: Set(request.customer_id),
            primary_supplier_id: Set(request.primary_supplier_id),
            secondary_supplier_id: Set(request.secondary_supplier_id),
            cost_price: Set(request.cost_price),
            selling_price: Set(request.selling_price),
            stock: Set(request.stock),
            is_active: Set(true),
            is_job_work: Set(request.is_job_work),
            manufacturing_condition: Set(request.manufacturing_condition),
            lead_time_days: Set(request.lead_time_days),
            moq: Set(request.moq),
            uom: Set(request.uom),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        write_route(&txn, model.id, &request.required_processes).await?;
        let entry =
            record_price(&txn, model.id, model.cost_price, model.selling_price).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.parts.created", 1);
        info!(part_id = %model.id, sku = %model.sku, "Part created");
        if let Err(e) = self.event_sender.send(Event::PartCreated(model.id)).await {
            warn!(error = %e, part_id = %model.id, "Failed to send part created event");
        }

        Ok(PartDetail {
            part: model,
            required_processes: request.required_processes,
            price_history: vec![entry],
        })
    }

    #[instrument(skip(self))]
    pub async fn get_part(&self, id: Uuid) -> Result<PartDetail, ServiceError> {
        let db = &*self.db_pool;
        let part = find_part(db, id).await?;
        let required_processes = load_route(db, id).await?;
        let price_history = self.price_history(id).await?;
        Ok(PartDetail {
            part,
            required_processes,
            price_history,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_parts(
        &self,
        filter: PartFilter,
        page: PageRequest,
    ) -> Result<Page<part::Model>, ServiceError> {
        let mut query = part::Entity::find().order_by_asc(part::Column::Sku);
        if let Some(active) = filter.active {
            query = query.filter(part::Column::IsActive.eq(active));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(part::Column::CustomerId.eq(customer_id));
        }
        if let Some(job_work) = filter.job_work {
            query = query.filter(part::Column::IsJobWork.eq(job_work));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_part(
        &self,
        id: Uuid,
        request: UpdatePartRequest,
    ) -> Result<PartDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let existing = find_part(&txn, id).await?;

        if request.is_active == Some(false) && existing.is_active {
            ensure_no_open_orders(&txn, &existing).await?;
        }

        let new_cost = request.cost_price.unwrap_or(existing.cost_price);
        let new_selling = request.selling_price.unwrap_or(existing.selling_price);
        ensure_non_negative_prices(new_cost, new_selling)?;
        let price_changed =
            new_cost != existing.cost_price || new_selling != existing.selling_price;

        let route = match request.required_processes {
            Some(ref processes) => processes.clone(),
            None => load_route(&txn, id).await?,
        };
        let is_job_work = request.is_job_work.unwrap_or(existing.is_job_work);
        if is_job_work && route.is_empty() {
            return Err(ServiceError::ValidationError(
                "Job-work parts need at least one required process".to_string(),
            ));
        }

        if let Some(supplier_id) = request.primary_supplier_id {
            ensure_exists::<supplier::Entity, _>(&txn, supplier_id, "Supplier").await?;
        }
        if let Some(supplier_id) = request.secondary_supplier_id {
            ensure_exists::<supplier::Entity, _>(&txn, supplier_id, "Supplier").await?;
        }

        let mut active: part::ActiveModel = existing.into();
        if let Some(v) = request.drawing_number {
            active.drawing_number = Set(v);
        }
        if let Some(v) = request.name {
            active.name = Set(v);
        }
        if let Some(v) = request.revision {
            active.revision = Set(v);
        }
        if let Some(v) = request.description {
            active.description = Set(Some(v));
        }
        if let Some(v) = request.primary_supplier_id {
            active.primary_supplier_id = Set(v);
        }
        if let Some(v) = request.secondary_supplier_id {
            active.secondary_supplier_id = Set(Some(v));
        }
        if let Some(v) = request.is_active {
            active.is_active = Set(v);
        }
        if let Some(v) = request.manufacturing_condition {
            active.manufacturing_condition = Set(v);
        }
        if let Some(v) = request.lead_time_days {
            active.lead_time_days = Set(v);
        }
        if let Some(v) = request.moq {
            active.moq = Set(v);
        }
        if let Some(v) = request.uom {
            active.uom = Set(v);
        }
        active.is_job_work = Set(is_job_work);
        active.cost_price = Set(new_cost);
        active.selling_price = Set(new_selling);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        if let Some(ref processes) = request.required_processes {
            write_route(&txn, id, processes).await?;
        }
        if price_changed {
            record_price(&txn, id, new_cost, new_selling).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(part_id = %id, price_changed, "Part updated");
        if let Err(e) = self.event_sender.send(Event::PartUpdated(id)).await {
            warn!(error = %e, part_id = %id, "Failed to send part updated event");
        }
        if price_changed {
            let event = Event::PartPriceRevised {
                part_id: id,
                cost_price: new_cost,
                selling_price: new_selling,
            };
            if let Err(e) = self.event_sender.send(event).await {
                warn!(error = %e, part_id = %id, "Failed to send price revision event");
            }
        }

        let price_history = self.price_history(id).await?;
        Ok(PartDetail {
            part: updated,
            required_processes: route,
            price_history,
        })
    }

    /// Price revisions, newest first
    #[instrument(skip(self))]
    pub async fn price_history(
        &self,
        part_id: Uuid,
    ) -> Result<Vec<part_price_history::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_part(db, part_id).await?;
        part_price_history::Entity::find()
            .filter(part_price_history::Column::PartId.eq(part_id))
            .order_by_desc(part_price_history::Column::EffectiveDate)
            .order_by_desc(part_price_history::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

pub(crate) async fn find_part<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<part::Model, ServiceError> {
    part::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Part", id))
}

/// Process ids of a part's route in stage order
pub(crate) async fn load_route<C: ConnectionTrait>(
    conn: &C,
    part_id: Uuid,
) -> Result<Vec<Uuid>, ServiceError> {
    Ok(part_process::Entity::find()
        .filter(part_process::Column::PartId.eq(part_id))
        .order_by_asc(part_process::Column::Position)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|stage| stage.process_id)
        .collect())
}

async fn ensure_exists<E, C>(conn: &C, id: Uuid, kind: &str) -> Result<(), ServiceError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = Uuid>,
    C: ConnectionTrait,
{
    let found = E::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if found.is_none() {
        return Err(ServiceError::not_found(kind, id));
    }
    Ok(())
}

fn ensure_non_negative_prices(cost: Decimal, selling: Decimal) -> Result<(), ServiceError> {
    if cost < Decimal::ZERO || selling < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Prices cannot be negative".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_no_open_orders<C: ConnectionTrait>(
    conn: &C,
    part: &part::Model,
) -> Result<(), ServiceError> {
    let open_sales = sales_order_item::Entity::find()
        .inner_join(sales_order::Entity)
        .filter(sales_order_item::Column::PartId.eq(part.id))
        .filter(sales_order::Column::Status.ne(OrderStatus::Completed))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if open_sales > 0 {
        return Err(ServiceError::InvalidOperation(format!(
            "Part {} is on an open sales order and cannot be deactivated",
            part.sku
        )));
    }

    let open_purchases = purchase_order_item::Entity::find()
        .inner_join(purchase_order::Entity)
        .filter(purchase_order_item::Column::PartId.eq(part.id))
        .filter(
            purchase_order::Column::Status
                .is_not_in([OrderStatus::Completed, OrderStatus::Invoiced]),
        )
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if open_purchases > 0 {
        return Err(ServiceError::InvalidOperation(format!(
            "Part {} is on an open purchase order and cannot be deactivated",
            part.sku
        )));
    }
    Ok(())
}

async fn write_route<C: ConnectionTrait>(
    conn: &C,
    part_id: Uuid,
    processes: &[Uuid],
) -> Result<(), ServiceError> {
    part_process::Entity::delete_many()
        .filter(part_process::Column::PartId.eq(part_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    for (position, process_id) in processes.iter().enumerate() {
        if process::Entity::find_by_id(*process_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .is_none()
        {
            return Err(ServiceError::not_found("Process", process_id));
        }
        part_process::ActiveModel {
            id: Set(Uuid::new_v4()),
            part_id: Set(part_id),
            position: Set(position as i32),
            process_id: Set(*process_id),
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;
    }
    Ok(())
}

async fn record_price<C: ConnectionTrait>(
    conn: &C,
    part_id: Uuid,
    cost_price: Decimal,
    selling_price: Decimal,
) -> Result<part_price_history::Model, ServiceError> {
    let now = Utc::now();
    part_price_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        part_id: Set(part_id),
        effective_date: Set(now.date_naive()),
        cost_price: Set(cost_price),
        selling_price: Set(selling_price),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_prices_are_rejected() {
        assert!(ensure_non_negative_prices(dec!(-0.01), dec!(5)).is_err());
        assert!(ensure_non_negative_prices(dec!(0), dec!(0)).is_ok());
    }

    #[test]
    fn part_request_defaults_fill_ordering_terms() {
        let json = serde_json::json!({
            "drawing_number": "DRW-1",
            "name": "Bracket",
            "revision": "A",
            "customer_id": Uuid::new_v4(),
            "primary_supplier_id": Uuid::new_v4(),
            "cost_price": "10.00",
            "selling_price": "15.00",
            "manufacturing_condition": "Heat Treated"
        });
        let request: CreatePartRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.moq, 1);
        assert_eq!(request.uom, "Nos");
        assert_eq!(request.stock, 0);
        assert!(!request.is_job_work);
        assert_eq!(
            request.manufacturing_condition,
            ManufacturingCondition::HeatTreated
        );
    }
}
