use crate::{
    db::DbPool,
    entities::company_settings::{self, SETTINGS_ROW_ID},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Document sequences drawn from the settings row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    SalesOrder,
    PurchaseOrder,
    CustomerInvoice,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub tax_identifier: Option<String>,
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub base_currency: Option<String>,
    #[validate(length(min = 1))]
    pub country: Option<String>,
    #[validate(custom = "validate_prefix")]
    pub so_prefix: Option<String>,
    #[validate(custom = "validate_prefix")]
    pub po_prefix: Option<String>,
    #[validate(custom = "validate_prefix")]
    pub inv_prefix: Option<String>,
    #[validate(range(min = 1))]
    pub so_next_number: Option<i32>,
    #[validate(range(min = 1))]
    pub po_next_number: Option<i32>,
    #[validate(range(min = 1))]
    pub inv_next_number: Option<i32>,
    pub include_customer_in_po: Option<bool>,
}

fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.trim().is_empty() {
        let mut err = ValidationError::new("prefix");
        err.message = Some("Prefix must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Reads the settings row, inserting factory defaults on first access
pub(crate) async fn load_or_init<C: ConnectionTrait>(
    conn: &C,
) -> Result<company_settings::Model, ServiceError> {
    if let Some(row) = company_settings::Entity::find_by_id(SETTINGS_ROW_ID)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
    {
        return Ok(row);
    }

    let defaults = company_settings::Model::defaults();
    let row = company_settings::ActiveModel {
        id: Set(defaults.id),
        name: Set(defaults.name),
        address: Set(defaults.address),
        tax_identifier: Set(defaults.tax_identifier),
        base_currency: Set(defaults.base_currency),
        country: Set(defaults.country),
        so_prefix: Set(defaults.so_prefix),
        po_prefix: Set(defaults.po_prefix),
        inv_prefix: Set(defaults.inv_prefix),
        so_next_number: Set(defaults.so_next_number),
        po_next_number: Set(defaults.po_next_number),
        inv_next_number: Set(defaults.inv_next_number),
        include_customer_in_po: Set(defaults.include_customer_in_po),
        updated_at: Set(defaults.updated_at),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;
    info!("Company settings initialised with defaults");
    Ok(row)
}

/// Returns `prefix + next` for `kind` and advances the counter on `conn`
pub(crate) async fn allocate_number<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
) -> Result<String, ServiceError> {
    let settings = load_or_init(conn).await?;
    let (number, mut active) = match kind {
        DocumentKind::SalesOrder => {
            let n = settings.so_next_number;
            let number = format!("{}{}", settings.so_prefix, n);
            let mut active: company_settings::ActiveModel = settings.into();
            active.so_next_number = Set(n + 1);
            (number, active)
        }
        DocumentKind::PurchaseOrder => {
            let n = settings.po_next_number;
            let number = format!("{}{}", settings.po_prefix, n);
            let mut active: company_settings::ActiveModel = settings.into();
            active.po_next_number = Set(n + 1);
            (number, active)
        }
        DocumentKind::CustomerInvoice => {
            let n = settings.inv_next_number;
            let number = format!("{}{}", settings.inv_prefix, n);
            let mut active: company_settings::ActiveModel = settings.into();
            active.inv_next_number = Set(n + 1);
            (number, active)
        }
    };
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(ServiceError::db_error)?;
    Ok(number)
}

/// Company profile and numbering sequences
#[derive(Clone)]
pub struct SettingsService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SettingsService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<company_settings::Model, ServiceError> {
        load_or_init(&*self.db_pool).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_settings(
        &self,
        request: UpdateSettingsRequest,
    ) -> Result<company_settings::Model, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let current = load_or_init(&txn).await?;
        let mut active: company_settings::ActiveModel = current.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }
        if let Some(tax_identifier) = request.tax_identifier {
            active.tax_identifier = Set(Some(tax_identifier));
        }
        if let Some(currency) = request.base_currency {
            active.base_currency = Set(currency.to_ascii_uppercase());
        }
        if let Some(country) = request.country {
            active.country = Set(country);
        }
        if let Some(prefix) = request.so_prefix {
            active.so_prefix = Set(prefix);
        }
        if let Some(prefix) = request.po_prefix {
            active.po_prefix = Set(prefix);
        }
        if let Some(prefix) = request.inv_prefix {
            active.inv_prefix = Set(prefix);
        }
        if let Some(n) = request.so_next_number {
            active.so_next_number = Set(n);
        }
        if let Some(n) = request.po_next_number {
            active.po_next_number = Set(n);
        }
        if let Some(n) = request.inv_next_number {
            active.inv_next_number = Set(n);
        }
        if let Some(flag) = request.include_customer_in_po {
            active.include_customer_in_po = Set(flag);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!("Company settings updated");
        if let Err(e) = self.event_sender.send(Event::SettingsUpdated).await {
            warn!(error = %e, "Failed to send settings updated event");
        }

        Ok(updated)
    }
}
