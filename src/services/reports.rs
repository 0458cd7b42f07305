use crate::{
    db::DbPool,
    entities::{customer, purchase_order, sales_order, supplier},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedParty {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummaryReport {
    pub total_sales: Decimal,
    pub total_purchases: Decimal,
    pub net_position: Decimal,
    pub top_customers: Vec<RankedParty>,
    pub top_suppliers: Vec<RankedParty>,
}

#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Sales against purchases with the largest counterparties
    #[instrument(skip(self))]
    pub async fn summary_report(&self) -> Result<SummaryReport, ServiceError> {
        let db = &*self.db_pool;

        let sales = sales_order::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let purchases = purchase_order::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let total_sales: Decimal = sales.iter().map(|so| so.total_amount).sum();
        let total_purchases: Decimal = purchases.iter().map(|po| po.total_amount).sum();

        let customers: HashMap<Uuid, (String, String)> = customer::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|c| (c.id, (c.code, c.name)))
            .collect();
        let suppliers: HashMap<Uuid, (String, String)> = supplier::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| (s.id, (s.code, s.name)))
            .collect();

        let top_customers = rank(
            sales.iter().map(|so| (so.customer_id, so.total_amount)),
            &customers,
        );
        let top_suppliers = rank(
            purchases.iter().map(|po| (po.supplier_id, po.total_amount)),
            &suppliers,
        );

        Ok(SummaryReport {
            total_sales,
            total_purchases,
            net_position: total_sales - total_purchases,
            top_customers,
            top_suppliers,
        })
    }
}

/// Totals per party, highest first, truncated to the top entries
fn rank(
    amounts: impl Iterator<Item = (Uuid, Decimal)>,
    names: &HashMap<Uuid, (String, String)>,
) -> Vec<RankedParty> {
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for (id, amount) in amounts {
        *totals.entry(id).or_insert(Decimal::ZERO) += amount;
    }

    let mut ranked: Vec<RankedParty> = totals
        .into_iter()
        .map(|(id, value)| {
            let (code, name) = names.get(&id).cloned().unwrap_or_default();
            RankedParty {
                id,
                code,
                name,
                value,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.code.cmp(&b.code)));
    ranked.truncate(TOP_N);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rank_sums_per_party_and_keeps_top_five() {
        let ids: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
        let names: HashMap<Uuid, (String, String)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, (format!("CUST-{:04}", i + 1), format!("Customer {}", i))))
            .collect();

        let mut amounts: Vec<(Uuid, Decimal)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, Decimal::from(i as i64 * 10)))
            .collect();
        amounts.push((ids[0], dec!(1000)));

        let ranked = rank(amounts.into_iter(), &names);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].id, ids[0]);
        assert_eq!(ranked[0].value, dec!(1000));
        assert_eq!(ranked[1].value, dec!(60));
        assert!(ranked.windows(2).all(|w| w[0].value >= w[1].value));
    }
}
