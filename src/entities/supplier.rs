use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "suppliers")]
#[schema(as = Supplier)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub credit_period: i32,
    pub is_active: bool,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub tax_identifier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supplier_process_price::Entity")]
    ProcessPrices,
}

impl Related<super::supplier_process_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProcessPrices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
