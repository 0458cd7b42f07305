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
pub enum JobWorkStatus {
    #[sea_orm(string_value = "Issued")]
    Issued,
    #[sea_orm(string_value = "In Process")]
    #[serde(rename = "In Process")]
    #[strum(serialize = "In Process")]
    InProcess,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Returned")]
    Returned,
    #[sea_orm(string_value = "Received")]
    Received,
    #[sea_orm(string_value = "Inwarded")]
    Inwarded,
}

/// Subcontract order sending a part out for one stage of its process route
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "job_work_orders")]
#[schema(as = JobWorkOrder)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub linked_po_number: String,
    pub supplier_id: Uuid,
    pub part_id: Uuid,
    pub process_id: Uuid,
    pub sales_order_id: Uuid,
    pub process_index: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub currency: String,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub challan_number: Option<String>,
    pub inward_reference: Option<String>,
    pub inwarded_date: Option<NaiveDate>,
    pub status: JobWorkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
