use super::{fetch_page, parts::find_part, parts::load_route, receipts::add_stock, Page, PageRequest};
use crate::{
    db::DbPool,
    entities::{
        customer_invoice, customer_invoice_item, goods_receipt, goods_receipt_item,
        job_work_order, part, stock_adjustment, JobWorkStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentRequest {
    pub part_id: Uuid,
    /// Signed correction; positive adds stock
    #[validate(custom = "validate_non_zero")]
    pub quantity: i32,
    #[validate(length(min = 1, message = "A reason is required"))]
    pub reason: String,
    pub adjustment_date: Option<NaiveDate>,
}

fn validate_non_zero(quantity: i32) -> Result<(), ValidationError> {
    if quantity == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("Adjustment quantity cannot be zero".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    /// Parts strictly below this stock level are flagged
    pub threshold: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdjustmentFilter {
    pub part_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockLine {
    pub part_id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock: i32,
    pub cost_price: Decimal,
    pub stock_value: Decimal,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockOverview {
    pub threshold: i32,
    pub total_valuation: Decimal,
    pub low_stock_count: usize,
    pub items: Vec<StockLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementKind {
    Receipt,
    JobWorkInward,
    Shipment,
    Correction,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockMovement {
    pub date: NaiveDate,
    pub kind: MovementKind,
    /// Signed quantity; negative leaves stock
    pub quantity: i32,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyMovement {
    pub date: NaiveDate,
    pub inward: i32,
    pub outward: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartMovements {
    pub part_id: Uuid,
    pub current_stock: i32,
    pub movements: Vec<StockMovement>,
    pub daily_summary: Vec<DailyMovement>,
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    low_stock_threshold: i32,
}

impl InventoryService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            low_stock_threshold,
        }
    }

    /// Applies a manual stock correction
    #[instrument(skip(self, request), fields(part_id = %request.part_id, quantity = request.quantity))]
    pub async fn adjust_stock(
        &self,
        request: StockAdjustmentRequest,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let part = add_stock(&txn, request.part_id, request.quantity).await?;
        let adjustment = stock_adjustment::ActiveModel {
            id: Set(Uuid::new_v4()),
            part_id: Set(part.id),
            adjustment_qty: Set(request.quantity),
            reason: Set(request.reason.trim().to_string()),
            adjustment_date: Set(request
                .adjustment_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("scm.inventory.adjustments", 1);
        info!(part_id = %part.id, new_stock = part.stock, "Stock adjusted");
        let event = Event::StockAdjusted {
            part_id: part.id,
            adjustment: request.quantity,
            new_stock: part.stock,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, part_id = %part.id, "Failed to send stock adjusted event");
        }
        Ok(adjustment)
    }

    #[instrument(skip(self))]
    pub async fn list_adjustments(
        &self,
        filter: AdjustmentFilter,
        page: PageRequest,
    ) -> Result<Page<stock_adjustment::Model>, ServiceError> {
        let mut query = stock_adjustment::Entity::find()
            .order_by_desc(stock_adjustment::Column::AdjustmentDate)
            .order_by_desc(stock_adjustment::Column::CreatedAt);
        if let Some(part_id) = filter.part_id {
            query = query.filter(stock_adjustment::Column::PartId.eq(part_id));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self))]
    pub async fn stock_overview(
        &self,
        threshold: Option<i32>,
    ) -> Result<StockOverview, ServiceError> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);
        let parts = part::Entity::find()
            .order_by_asc(part::Column::Sku)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(summarize(parts, threshold))
    }

    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: Option<i32>) -> Result<Vec<StockLine>, ServiceError> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);
        let parts = part::Entity::find()
            .filter(part::Column::Stock.lt(threshold))
            .order_by_asc(part::Column::Stock)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(parts
            .iter()
            .map(|p| stock_line(p, threshold))
            .collect())
    }

    /// Every stock movement of a part, newest first, with per-day totals
    #[instrument(skip(self))]
    pub async fn part_movements(&self, part_id: Uuid) -> Result<PartMovements, ServiceError> {
        let db = &*self.db_pool;
        let part = find_part(db, part_id).await?;
        let mut movements = Vec::new();

        let receipt_lines = goods_receipt_item::Entity::find()
            .filter(goods_receipt_item::Column::PartId.eq(part_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if !receipt_lines.is_empty() {
            let ids: Vec<Uuid> = receipt_lines.iter().map(|l| l.goods_receipt_id).collect();
            let receipts: HashMap<Uuid, goods_receipt::Model> = goods_receipt::Entity::find()
                .filter(goods_receipt::Column::Id.is_in(ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|r| (r.id, r))
                .collect();
            for line in receipt_lines {
                if let Some(receipt) = receipts.get(&line.goods_receipt_id) {
                    movements.push(StockMovement {
                        date: receipt.received_date,
                        kind: MovementKind::Receipt,
                        quantity: line.quantity,
                        reference: receipt.number.clone(),
                    });
                }
            }
        }

        let invoice_lines = customer_invoice_item::Entity::find()
            .filter(customer_invoice_item::Column::PartId.eq(part_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if !invoice_lines.is_empty() {
            let ids: Vec<Uuid> = invoice_lines.iter().map(|l| l.customer_invoice_id).collect();
            let invoices: HashMap<Uuid, customer_invoice::Model> = customer_invoice::Entity::find()
                .filter(customer_invoice::Column::Id.is_in(ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|i| (i.id, i))
                .collect();
            for line in invoice_lines {
                if let Some(invoice) = invoices.get(&line.customer_invoice_id) {
                    movements.push(StockMovement {
                        date: invoice.invoice_date,
                        kind: MovementKind::Shipment,
                        quantity: -line.quantity,
                        reference: invoice.number.clone(),
                    });
                }
            }
        }

        let adjustments = stock_adjustment::Entity::find()
            .filter(stock_adjustment::Column::PartId.eq(part_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        movements.extend(adjustments.into_iter().map(|a| StockMovement {
            date: a.adjustment_date,
            kind: MovementKind::Correction,
            quantity: a.adjustment_qty,
            reference: a.reason,
        }));

        let final_index = load_route(db, part_id).await?.len() as i32 - 1;
        if final_index >= 0 {
            let inwards = job_work_order::Entity::find()
                .filter(job_work_order::Column::PartId.eq(part_id))
                .filter(job_work_order::Column::Status.eq(JobWorkStatus::Inwarded))
                .filter(job_work_order::Column::ProcessIndex.eq(final_index))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;
            movements.extend(inwards.into_iter().map(|jwo| StockMovement {
                date: jwo.inwarded_date.unwrap_or(jwo.order_date),
                kind: MovementKind::JobWorkInward,
                quantity: jwo.quantity,
                reference: jwo.number,
            }));
        }

        movements.sort_by(|a, b| b.date.cmp(&a.date));
        let daily_summary = daily_summary(&movements);

        Ok(PartMovements {
            part_id,
            current_stock: part.stock,
            movements,
            daily_summary,
        })
    }
}

fn stock_line(part: &part::Model, threshold: i32) -> StockLine {
    StockLine {
        part_id: part.id,
        sku: part.sku.clone(),
        name: part.name.clone(),
        stock: part.stock,
        cost_price: part.cost_price,
        stock_value: part.stock_value(),
        low_stock: part.stock < threshold,
    }
}

fn summarize(parts: Vec<part::Model>, threshold: i32) -> StockOverview {
    let items: Vec<StockLine> = parts.iter().map(|p| stock_line(p, threshold)).collect();
    StockOverview {
        threshold,
        total_valuation: items.iter().map(|i| i.stock_value).sum(),
        low_stock_count: items.iter().filter(|i| i.low_stock).count(),
        items,
    }
}

/// Inward and outward totals per day, newest first
fn daily_summary(movements: &[StockMovement]) -> Vec<DailyMovement> {
    let mut days: BTreeMap<NaiveDate, (i32, i32)> = BTreeMap::new();
    for movement in movements {
        let day = days.entry(movement.date).or_insert((0, 0));
        if movement.quantity >= 0 {
            day.0 += movement.quantity;
        } else {
            day.1 += -movement.quantity;
        }
    }
    days.into_iter()
        .rev()
        .map(|(date, (inward, outward))| DailyMovement {
            date,
            inward,
            outward,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn movement(day: u32, quantity: i32) -> StockMovement {
        StockMovement {
            date: date(day),
            kind: if quantity > 0 {
                MovementKind::Receipt
            } else {
                MovementKind::Shipment
            },
            quantity,
            reference: "ref".into(),
        }
    }

    #[test]
    fn daily_summary_groups_and_orders_newest_first() {
        let summary = daily_summary(&[movement(3, 10), movement(1, 5), movement(3, -4)]);
        assert_eq!(
            summary,
            vec![
                DailyMovement {
                    date: date(3),
                    inward: 10,
                    outward: 4
                },
                DailyMovement {
                    date: date(1),
                    inward: 5,
                    outward: 0
                },
            ]
        );
    }

    #[test]
    fn overview_values_stock_at_cost() {
        let now = Utc::now();
        let make = |sku: &str, stock: i32, cost| part::Model {
            id: Uuid::new_v4(),
            sku: sku.into(),
            drawing_number: "D".into(),
            name: sku.into(),
            revision: "A".into(),
            description: None,
            customer_id: Uuid::new_v4(),
            primary_supplier_id: Uuid::new_v4(),
            secondary_supplier_id: None,
            cost_price: cost,
            selling_price: cost,
            stock,
            is_active: true,
            is_job_work: false,
            manufacturing_condition: crate::entities::ManufacturingCondition::Machined,
            lead_time_days: 0,
            moq: 1,
            uom: "Nos".into(),
            created_at: now,
            updated_at: now,
        };
        let overview = summarize(
            vec![make("GKP-000001", 50, dec!(2.5)), make("GKP-000002", 10, dec!(4))],
            30,
        );
        assert_eq!(overview.total_valuation, dec!(165));
        assert_eq!(overview.low_stock_count, 1);
        assert!(overview.items[1].low_stock);
    }

    #[test]
    fn zero_adjustment_is_rejected() {
        assert!(validate_non_zero(0).is_err());
        assert!(validate_non_zero(-3).is_ok());
    }
}
