use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ToolingStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Maintenance")]
    Maintenance,
    #[sea_orm(string_value = "Retired")]
    Retired,
    #[sea_orm(string_value = "Development")]
    Development,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Obsolete")]
    Obsolete,
}

impl ToolingStatus {
    /// Whether the asset can still accumulate production cycles
    pub fn accepts_usage(self) -> bool {
        !matches!(self, ToolingStatus::Retired | ToolingStatus::Obsolete)
    }
}

/// A die, fixture or mould tracked against its expected life
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "tooling")]
#[schema(as = Tooling)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub asset_number: String,
    pub name: String,
    pub part_id: Uuid,
    pub customer_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub status: ToolingStatus,
    pub customer_value: Decimal,
    pub supplier_value: Decimal,
    pub expected_life_cycles: i64,
    pub current_cycles: i64,
    pub last_maintenance_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Consumed share of the expected life, as a percentage rounded to 2 dp
    pub fn usage_percent(&self) -> Decimal {
        if self.expected_life_cycles <= 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.current_cycles) * Decimal::ONE_HUNDRED
            / Decimal::from(self.expected_life_cycles))
        .round_dp(2)
    }
}
