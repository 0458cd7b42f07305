use crate::{
    db::DbPool,
    entities::process,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProcessRequest {
    #[validate(length(min = 1, max = 120, message = "Process name is required"))]
    pub name: String,
    pub description: Option<String>,
}

/// Manufacturing process master data
#[derive(Clone)]
pub struct ProcessService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProcessService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_process(
        &self,
        request: CreateProcessRequest,
    ) -> Result<process::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let name = request.name.trim().to_string();

        let duplicate = process::Entity::find()
            .filter(process::Column::Name.eq(name.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Process '{}' already exists",
                name
            )));
        }

        let model = process::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(request.description),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(process_id = %model.id, "Process created");
        if let Err(e) = self.event_sender.send(Event::ProcessCreated(model.id)).await {
            warn!(error = %e, process_id = %model.id, "Failed to send process created event");
        }
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_processes(&self) -> Result<Vec<process::Model>, ServiceError> {
        process::Entity::find()
            .order_by_asc(process::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get_process(&self, id: Uuid) -> Result<process::Model, ServiceError> {
        process::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Process", id))
    }
}
