use super::{fetch_page, sequential_code, Page, PageRequest};
use crate::{
    db::DbPool,
    entities::{process, purchase_order, supplier, supplier_process_price, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const DEFAULT_CREDIT_PERIOD: i32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessPriceInput {
    pub process_id: Uuid,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(range(min = 0))]
    pub credit_period: Option<i32>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub tax_identifier: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_pricing")]
    pub process_pricing: Vec<ProcessPriceInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = 0))]
    pub credit_period: Option<i32>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub tax_identifier: Option<String>,
    pub is_active: Option<bool>,
    /// Replaces the whole price list when present
    #[validate(custom = "validate_pricing")]
    pub process_pricing: Option<Vec<ProcessPriceInput>>,
}

fn validate_pricing(pricing: &[ProcessPriceInput]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for entry in pricing {
        if entry.price < Decimal::ZERO {
            let mut err = ValidationError::new("negative_price");
            err.message = Some("Process price cannot be negative".into());
            return Err(err);
        }
        if !seen.insert(entry.process_id) {
            let mut err = ValidationError::new("duplicate_process");
            err.message = Some("Each process may be priced once".into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplierFilter {
    pub active: Option<bool>,
}

/// Supplier together with its process price list
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: supplier::Model,
    pub process_pricing: Vec<supplier_process_price::Model>,
}

#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let code = sequential_code(supplier::Entity::find(), &txn, "V-", 4).await?;
        let now = Utc::now();
        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(request.name.trim().to_string()),
            email: Set(request.email),
            address: Set(request.address),
            credit_period: Set(request.credit_period.unwrap_or(DEFAULT_CREDIT_PERIOD)),
            is_active: Set(true),
            contact_person: Set(request.contact_person),
            phone_number: Set(request.phone_number),
            tax_identifier: Set(request.tax_identifier),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let pricing = replace_pricing(&txn, model.id, &request.process_pricing).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(supplier_id = %model.id, code = %model.code, "Supplier created");
        if let Err(e) = self.event_sender.send(Event::SupplierCreated(model.id)).await {
            warn!(error = %e, supplier_id = %model.id, "Failed to send supplier created event");
        }
        Ok(SupplierDetail {
            supplier: model,
            process_pricing: pricing,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, id: Uuid) -> Result<SupplierDetail, ServiceError> {
        let db = &*self.db_pool;
        let supplier = supplier::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Supplier", id))?;
        let process_pricing = supplier_process_price::Entity::find()
            .filter(supplier_process_price::Column::SupplierId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(SupplierDetail {
            supplier,
            process_pricing,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        filter: SupplierFilter,
        page: PageRequest,
    ) -> Result<Page<supplier::Model>, ServiceError> {
        let mut query = supplier::Entity::find().order_by_asc(supplier::Column::Code);
        if let Some(active) = filter.active {
            query = query.filter(supplier::Column::IsActive.eq(active));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        request: UpdateSupplierRequest,
    ) -> Result<SupplierDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let existing = supplier::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Supplier", id))?;

        if request.is_active == Some(false) && existing.is_active {
            let open_orders = purchase_order::Entity::find()
                .filter(purchase_order::Column::SupplierId.eq(id))
                .filter(
                    purchase_order::Column::Status
                        .is_not_in([OrderStatus::Completed, OrderStatus::Invoiced]),
                )
                .count(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if open_orders > 0 {
                return Err(ServiceError::InvalidOperation(format!(
                    "Supplier {} has {} open purchase order(s) and cannot be deactivated",
                    existing.code, open_orders
                )));
            }
        }

        let mut active: supplier::ActiveModel = existing.into();
        if let Some(v) = request.name {
            active.name = Set(v);
        }
        if let Some(v) = request.email {
            active.email = Set(v);
        }
        if let Some(v) = request.address {
            active.address = Set(v);
        }
        if let Some(v) = request.credit_period {
            active.credit_period = Set(v);
        }
        if let Some(v) = request.contact_person {
            active.contact_person = Set(Some(v));
        }
        if let Some(v) = request.phone_number {
            active.phone_number = Set(Some(v));
        }
        if let Some(v) = request.tax_identifier {
            active.tax_identifier = Set(Some(v));
        }
        if let Some(v) = request.is_active {
            active.is_active = Set(v);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let process_pricing = match request.process_pricing {
            Some(pricing) => replace_pricing(&txn, id, &pricing).await?,
            None => supplier_process_price::Entity::find()
                .filter(supplier_process_price::Column::SupplierId.eq(id))
                .all(&txn)
                .await
                .map_err(ServiceError::db_error)?,
        };
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(supplier_id = %id, "Supplier updated");
        if let Err(e) = self.event_sender.send(Event::SupplierUpdated(id)).await {
            warn!(error = %e, supplier_id = %id, "Failed to send supplier updated event");
        }
        Ok(SupplierDetail {
            supplier: updated,
            process_pricing,
        })
    }

    /// The supplier's rate for `process_id`, if it quotes one
    #[instrument(skip(self))]
    pub async fn process_price(
        &self,
        supplier_id: Uuid,
        process_id: Uuid,
    ) -> Result<Option<Decimal>, ServiceError> {
        lookup_process_price(&*self.db_pool, supplier_id, process_id).await
    }
}

pub(crate) async fn lookup_process_price<C: ConnectionTrait>(
    conn: &C,
    supplier_id: Uuid,
    process_id: Uuid,
) -> Result<Option<Decimal>, ServiceError> {
    Ok(supplier_process_price::Entity::find()
        .filter(supplier_process_price::Column::SupplierId.eq(supplier_id))
        .filter(supplier_process_price::Column::ProcessId.eq(process_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|row| row.price))
}

async fn replace_pricing<C: ConnectionTrait>(
    conn: &C,
    supplier_id: Uuid,
    pricing: &[ProcessPriceInput],
) -> Result<Vec<supplier_process_price::Model>, ServiceError> {
    supplier_process_price::Entity::delete_many()
        .filter(supplier_process_price::Column::SupplierId.eq(supplier_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut rows = Vec::with_capacity(pricing.len());
    for entry in pricing {
        let exists = process::Entity::find_by_id(entry.process_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if exists.is_none() {
            return Err(ServiceError::not_found("Process", entry.process_id));
        }
        let row = supplier_process_price::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(supplier_id),
            process_id: Set(entry.process_id),
            price: Set(entry.price),
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pricing_rejects_duplicate_processes() {
        let process_id = Uuid::new_v4();
        let pricing = vec![
            ProcessPriceInput {
                process_id,
                price: dec!(10),
            },
            ProcessPriceInput {
                process_id,
                price: dec!(12),
            },
        ];
        assert!(validate_pricing(&pricing).is_err());
    }

    #[test]
    fn pricing_rejects_negative_rates() {
        let pricing = vec![ProcessPriceInput {
            process_id: Uuid::new_v4(),
            price: dec!(-1),
        }];
        assert!(validate_pricing(&pricing).is_err());
        assert!(validate_pricing(&[]).is_ok());
    }
}
