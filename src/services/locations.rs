use crate::{
    db::DbPool,
    entities::inventory_location::{self, Entity as InventoryLocation, LocationType},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub description: Option<String>,
    pub location_type: Option<LocationType>,
}

/// Registry of the stock-holding places ledger rows can reference by id.
/// Free-text location names on ledger rows stay legal for places that were
/// never registered.
#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_location(
        &self,
        input: NewLocation,
    ) -> Result<inventory_location::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name is required".to_string(),
            ));
        }

        let existing = InventoryLocation::find()
            .filter(inventory_location::Column::Name.eq(input.name.trim()))
            .count(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Location {} already exists",
                input.name.trim()
            )));
        }

        let mut entry = inventory_location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            ..Default::default()
        };
        if let Some(location_type) = input.location_type {
            entry.location_type = Set(location_type.as_str().to_string());
        }

        let created = entry
            .insert(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        if let Err(e) = self
            .event_sender
            .send(Event::LocationCreated(created.id))
            .await
        {
            warn!(error = %e, "failed to publish LocationCreated event");
        }

        info!(location_id = %created.id, name = %created.name, "created location");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_locations(
        &self,
        active_only: bool,
    ) -> Result<Vec<inventory_location::Model>, ServiceError> {
        let mut query = InventoryLocation::find();
        if active_only {
            query = query.filter(inventory_location::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(inventory_location::Column::Name)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
