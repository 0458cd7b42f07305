use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Physical condition a part is supplied in
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
pub enum ManufacturingCondition {
    #[sea_orm(string_value = "Casting")]
    Casting,
    #[sea_orm(string_value = "Machined")]
    Machined,
    #[sea_orm(string_value = "Surface Treated")]
    #[serde(rename = "Surface Treated")]
    #[strum(serialize = "Surface Treated")]
    SurfaceTreated,
    #[sea_orm(string_value = "Heat Treated")]
    #[serde(rename = "Heat Treated")]
    #[strum(serialize = "Heat Treated")]
    HeatTreated,
    #[sea_orm(string_value = "Forged")]
    Forged,
    #[sea_orm(string_value = "Grinding")]
    Grinding,
    #[sea_orm(string_value = "Assembly")]
    Assembly,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "parts")]
#[schema(as = Part)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    pub drawing_number: String,
    pub name: String,
    pub revision: String,
    pub description: Option<String>,
    pub customer_id: Uuid,
    pub primary_supplier_id: Uuid,
    pub secondary_supplier_id: Option<Uuid>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub is_job_work: bool,
    pub manufacturing_condition: ManufacturingCondition,
    pub lead_time_days: i32,
    pub moq: i32,
    pub uom: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::part_process::Entity")]
    PartProcesses,
    #[sea_orm(has_many = "super::part_price_history::Entity")]
    PriceHistory,
}

impl Related<super::part_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartProcesses.def()
    }
}

impl Related<super::part_price_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn stock_value(&self) -> Decimal {
        self.cost_price * Decimal::from(self.stock)
    }
}
