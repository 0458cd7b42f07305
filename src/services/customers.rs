use super::{fetch_page, sequential_code, Page, PageRequest};
use crate::{
    db::DbPool,
    entities::{customer, sales_order, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_CREDIT_PERIOD: i32 = 30;
const DEFAULT_ADVANCE_TERMS: &str = "No Advance";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    #[validate(length(min = 1))]
    pub billing_address: String,
    /// Defaults to the billing address
    pub shipping_address: Option<String>,
    /// Defaults to the shipping address
    pub delivery_address: Option<String>,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency: String,
    #[validate(range(min = 0))]
    pub credit_period: Option<i32>,
    pub advance_terms: Option<String>,
    pub advance_balance: Option<Decimal>,
    pub tax_identifier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub delivery_address: Option<String>,
    pub country: Option<String>,
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency: Option<String>,
    #[validate(range(min = 0))]
    pub credit_period: Option<i32>,
    pub advance_terms: Option<String>,
    pub advance_balance: Option<Decimal>,
    pub tax_identifier: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    pub active: Option<bool>,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let code = sequential_code(customer::Entity::find(), &txn, "CUST-", 4).await?;
        let shipping = request
            .shipping_address
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| request.billing_address.clone());
        let delivery = request
            .delivery_address
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| shipping.clone());
        let now = Utc::now();

        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(request.name.trim().to_string()),
            email: Set(request.email),
            contact_person: Set(request.contact_person),
            phone_number: Set(request.phone_number),
            billing_address: Set(request.billing_address),
            shipping_address: Set(shipping),
            delivery_address: Set(delivery),
            country: Set(request.country),
            currency: Set(request.currency.to_ascii_uppercase()),
            credit_period: Set(request.credit_period.unwrap_or(DEFAULT_CREDIT_PERIOD)),
            advance_terms: Set(request
                .advance_terms
                .unwrap_or_else(|| DEFAULT_ADVANCE_TERMS.to_string())),
            advance_balance: Set(request.advance_balance.unwrap_or(Decimal::ZERO)),
            tax_identifier: Set(request.tax_identifier),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(customer_id = %model.id, code = %model.code, "Customer created");
        if let Err(e) = self.event_sender.send(Event::CustomerCreated(model.id)).await {
            warn!(error = %e, customer_id = %model.id, "Failed to send customer created event");
        }
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        filter: CustomerFilter,
        page: PageRequest,
    ) -> Result<Page<customer::Model>, ServiceError> {
        let mut query = customer::Entity::find().order_by_asc(customer::Column::Code);
        if let Some(active) = filter.active {
            query = query.filter(customer::Column::IsActive.eq(active));
        }
        fetch_page(query, &*self.db_pool, page).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let existing = customer::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer", id))?;

        if request.is_active == Some(false) && existing.is_active {
            let open_orders = sales_order::Entity::find()
                .filter(sales_order::Column::CustomerId.eq(id))
                .filter(sales_order::Column::Status.ne(OrderStatus::Completed))
                .count(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if open_orders > 0 {
                return Err(ServiceError::InvalidOperation(format!(
                    "Customer {} has {} open sales order(s) and cannot be deactivated",
                    existing.code, open_orders
                )));
            }
        }

        let mut active: customer::ActiveModel = existing.into();
        if let Some(v) = request.name {
            active.name = Set(v);
        }
        if let Some(v) = request.email {
            active.email = Set(v);
        }
        if let Some(v) = request.contact_person {
            active.contact_person = Set(Some(v));
        }
        if let Some(v) = request.phone_number {
            active.phone_number = Set(Some(v));
        }
        if let Some(v) = request.billing_address {
            active.billing_address = Set(v);
        }
        if let Some(v) = request.shipping_address {
            active.shipping_address = Set(v);
        }
        if let Some(v) = request.delivery_address {
            active.delivery_address = Set(v);
        }
        if let Some(v) = request.country {
            active.country = Set(v);
        }
        if let Some(v) = request.currency {
            active.currency = Set(v.to_ascii_uppercase());
        }
        if let Some(v) = request.credit_period {
            active.credit_period = Set(v);
        }
        if let Some(v) = request.advance_terms {
            active.advance_terms = Set(v);
        }
        if let Some(v) = request.advance_balance {
            active.advance_balance = Set(v);
        }
        if let Some(v) = request.tax_identifier {
            active.tax_identifier = Set(Some(v));
        }
        if let Some(v) = request.is_active {
            active.is_active = Set(v);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(customer_id = %id, "Customer updated");
        if let Err(e) = self.event_sender.send(Event::CustomerUpdated(id)).await {
            warn!(error = %e, customer_id = %id, "Failed to send customer updated event");
        }
        Ok(updated)
    }
}
