use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Singleton row holding company details and document sequences
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "company_settings")]
#[schema(as = CompanySettings)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub address: String,
    pub tax_identifier: Option<String>,
    pub base_currency: String,
    pub country: String,
    pub so_prefix: String,
    pub po_prefix: String,
    pub inv_prefix: String,
    pub so_next_number: i32,
    pub po_next_number: i32,
    pub inv_next_number: i32,
    pub include_customer_in_po: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Primary key of the only settings row
pub const SETTINGS_ROW_ID: i32 = 1;

impl Model {
    /// Factory defaults used when the row is first created
    pub fn defaults() -> Self {
        Self {
            id: SETTINGS_ROW_ID,
            name: "GK Global SCM".to_string(),
            address: String::new(),
            tax_identifier: None,
            base_currency: "INR".to_string(),
            country: "India".to_string(),
            so_prefix: "SO-GK-".to_string(),
            po_prefix: "PO-GK-".to_string(),
            inv_prefix: "INV-GK-".to_string(),
            so_next_number: 1001,
            po_next_number: 1001,
            inv_next_number: 1001,
            include_customer_in_po: false,
            updated_at: Utc::now(),
        }
    }
}
