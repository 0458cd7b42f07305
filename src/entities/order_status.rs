use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Workflow status shared by sales and purchase orders
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Confirmed")]
    Confirmed,
    #[sea_orm(string_value = "Pending Approval")]
    #[serde(rename = "Pending Approval")]
    #[strum(serialize = "Pending Approval")]
    PendingApproval,
    #[sea_orm(string_value = "PO Released")]
    #[serde(rename = "PO Released")]
    #[strum(serialize = "PO Released")]
    PoReleased,
    #[sea_orm(string_value = "Purchased")]
    Purchased,
    #[sea_orm(string_value = "Partially Received")]
    #[serde(rename = "Partially Received")]
    #[strum(serialize = "Partially Received")]
    PartiallyReceived,
    #[sea_orm(string_value = "Received")]
    Received,
    #[sea_orm(string_value = "Invoiced")]
    Invoiced,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

impl OrderStatus {
    /// A purchase order still awaiting goods or billing
    pub fn is_open_purchase(self) -> bool {
        !matches!(self, OrderStatus::Completed | OrderStatus::Invoiced)
    }

    /// A sales order that has not been closed out
    pub fn is_open_sale(self) -> bool {
        self != OrderStatus::Completed
    }

    /// Purchase order states that accept goods receipts
    pub fn accepts_receipts(self) -> bool {
        matches!(
            self,
            OrderStatus::PoReleased | OrderStatus::Purchased | OrderStatus::PartiallyReceived
        )
    }
}
