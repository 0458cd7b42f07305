use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "customer_invoice_items")]
#[schema(as = CustomerInvoiceItem)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_invoice_id: Uuid,
    pub part_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_invoice::Entity",
        from = "Column::CustomerInvoiceId",
        to = "super::customer_invoice::Column::Id",
        on_delete = "Cascade"
    )]
    CustomerInvoice,
}

impl Related<super::customer_invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerInvoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
