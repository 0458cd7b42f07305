use super::{fetch_page, Page, PageRequest};
use crate::{
    db::DbPool,
    entities::{customer, part, supplier, tooling, ToolingStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_EXPECTED_LIFE_CYCLES: i64 = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ToolingAssetInput {
    #[validate(length(min = 1, message = "Asset number is required"))]
    pub asset_number: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub status: Option<ToolingStatus>,
    #[serde(default)]
    pub customer_value: Decimal,
    #[serde(default)]
    pub supplier_value: Decimal,
    #[validate(range(min = 1))]
    pub expected_life_cycles: Option<i64>,
    pub last_maintenance_date: Option<NaiveDate>,
}

/// One or more assets belonging to the same customer and part
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OnboardToolingRequest {
    pub customer_id: Uuid,
    pub part_id: Uuid,
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one asset is required"))]
    pub assets: Vec<ToolingAssetInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateToolingRequest {
    pub status: Option<ToolingStatus>,
    pub customer_value: Option<Decimal>,
    pub supplier_value: Option<Decimal>,
    pub supplier_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub expected_life_cycles: Option<i64>,
    pub last_maintenance_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordCyclesRequest {
    #[validate(range(min = 1, message = "Cycles must be positive"))]
    pub cycles: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ToolingFilter {
    pub customer_id: Option<Uuid>,
    pub part_id: Option<Uuid>,
    pub status: Option<ToolingStatus>,
}

/// Tooling asset with its life consumption
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToolingView {
    #[serde(flatten)]
    pub tooling: tooling::Model,
    pub usage_percent: Decimal,
}

impl From<tooling::Model> for ToolingView {
    fn from(tooling: tooling::Model) -> Self {
        let usage_percent = tooling.usage_percent();
        Self {
            tooling,
            usage_percent,
        }
    }
}

#[derive(Clone)]
pub struct ToolingService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ToolingService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers every asset in the batch or none of them
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, part_id = %request.part_id, assets = request.assets.len()))]
    pub async fn onboard_tooling(
        &self,
        request: OnboardToolingRequest,
    ) -> Result<Vec<ToolingView>, ServiceError> {
        request.validate()?;

        let mut seen = HashSet::new();
        for asset in &request.assets {
            asset.validate()?;
            if !seen.insert(asset.asset_number.trim().to_string()) {
                return Err(ServiceError::ValidationError(format!(
                    "Asset number {} appears more than once",
                    asset.asset_number
                )));
            }
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer", request.customer_id))?;
        part::Entity::find_by_id(request.part_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Part", request.part_id))?;
        if let Some(supplier_id) = request.supplier_id {
            supplier::Entity::find_by_id(supplier_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::not_found("Supplier", supplier_id))?;
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(request.assets.len());
        for asset in request.assets {
            let asset_number = asset.asset_number.trim().to_string();
            let taken = tooling::Entity::find()
                .filter(tooling::Column::AssetNumber.eq(asset_number.clone()))
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Asset number {} is already registered",
                    asset_number
                )));
            }

            let model = tooling::ActiveModel {
                id: Set(Uuid::new_v4()),
                asset_number: Set(asset_number),
                name: Set(asset.name),
                part_id: Set(request.part_id),
                customer_id: Set(request.customer_id),
                supplier_id: Set(request.supplier_id),
                status: Set(asset.status.unwrap_or(ToolingStatus::Active)),
                customer_value: Set(asset.customer_value),
                supplier_value: Set(asset.supplier_value),
                expected_life_cycles: Set(asset
                    .expected_life_cycles
                    .unwrap_or(DEFAULT_EXPECTED_LIFE_CYCLES)),
                current_cycles: Set(0),
                last_maintenance_date: Set(asset.last_maintenance_date),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            created.push(model);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        let asset_ids: Vec<Uuid> = created.iter().map(|t| t.id).collect();
        info!(count = asset_ids.len(), "Tooling onboarded");
        let event = Event::ToolingOnboarded {
            customer_id: request.customer_id,
            part_id: request.part_id,
            asset_ids,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send tooling onboarded event");
        }

        Ok(created.into_iter().map(ToolingView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_tooling(
        &self,
        filter: ToolingFilter,
        page: PageRequest,
    ) -> Result<Page<ToolingView>, ServiceError> {
        let mut query = tooling::Entity::find().order_by_asc(tooling::Column::AssetNumber);
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(tooling::Column::CustomerId.eq(customer_id));
        }
        if let Some(part_id) = filter.part_id {
            query = query.filter(tooling::Column::PartId.eq(part_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(tooling::Column::Status.eq(status));
        }
        Ok(fetch_page(query, &*self.db_pool, page)
            .await?
            .map(ToolingView::from))
    }

    #[instrument(skip(self))]
    pub async fn get_tooling(&self, id: Uuid) -> Result<ToolingView, ServiceError> {
        self.find(id).await.map(ToolingView::from)
    }

    #[instrument(skip(self, request))]
    pub async fn update_tooling(
        &self,
        id: Uuid,
        request: UpdateToolingRequest,
    ) -> Result<ToolingView, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;

        let mut active: tooling::ActiveModel = existing.into();
        if let Some(v) = request.status {
            active.status = Set(v);
        }
        if let Some(v) = request.customer_value {
            active.customer_value = Set(v);
        }
        if let Some(v) = request.supplier_value {
            active.supplier_value = Set(v);
        }
        if let Some(v) = request.supplier_id {
            supplier::Entity::find_by_id(v)
                .one(&*self.db_pool)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::not_found("Supplier", v))?;
            active.supplier_id = Set(Some(v));
        }
        if let Some(v) = request.expected_life_cycles {
            active.expected_life_cycles = Set(v);
        }
        if let Some(v) = request.last_maintenance_date {
            active.last_maintenance_date = Set(Some(v));
        }
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(tooling_id = %id, status = %updated.status, "Tooling updated");
        if let Err(e) = self.event_sender.send(Event::ToolingUpdated(id)).await {
            warn!(error = %e, tooling_id = %id, "Failed to send tooling updated event");
        }
        Ok(updated.into())
    }

    /// Adds production cycles to an asset's counter
    #[instrument(skip(self, request), fields(cycles = request.cycles))]
    pub async fn record_cycles(
        &self,
        id: Uuid,
        request: RecordCyclesRequest,
    ) -> Result<ToolingView, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;
        if !existing.status.accepts_usage() {
            return Err(ServiceError::InvalidOperation(format!(
                "Tooling {} is {} and cannot record usage",
                existing.asset_number, existing.status
            )));
        }

        let current_cycles = existing
            .current_cycles
            .checked_add(request.cycles)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Cycle count for tooling {} would overflow",
                    existing.asset_number
                ))
            })?;
        let mut active: tooling::ActiveModel = existing.into();
        active.current_cycles = Set(current_cycles);
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let event = Event::ToolingCyclesRecorded {
            tooling_id: id,
            cycles: request.cycles,
            current_cycles,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, tooling_id = %id, "Failed to send tooling cycles event");
        }
        Ok(updated.into())
    }

    async fn find(&self, id: Uuid) -> Result<tooling::Model, ServiceError> {
        tooling::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Tooling", id))
    }
}
