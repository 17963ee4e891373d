use crate::{
    db::DbPool,
    entities::product::{self, Entity as Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Input for registering a new product.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub created_by: Option<String>,
    pub created_by_id: Option<Uuid>,
    pub created_by_email: Option<String>,
}

/// Metadata update for an existing product. `current_stock` is deliberately
/// absent: the stock level belongs to the transaction ledger.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
    pub min_stock_level: Option<Option<Decimal>>,
    pub max_stock_level: Option<Option<Decimal>>,
    pub unit_cost: Option<Option<Decimal>>,
    pub supplier: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Registry of stock-keeping products. Owns every product field except the
/// `current_stock` projection, which only the ledger writes.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        if input.sku.trim().is_empty() {
            return Err(ServiceError::ValidationError("sku is required".to_string()));
        }
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name is required".to_string(),
            ));
        }

        let existing = Product::find()
            .filter(product::Column::Sku.eq(input.sku.trim()))
            .count(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU {} already exists",
                input.sku.trim()
            )));
        }

        let mut entry = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku.trim().to_string()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            category: Set(input.category),
            min_stock_level: Set(input.min_stock_level),
            max_stock_level: Set(input.max_stock_level),
            unit_cost: Set(input.unit_cost),
            supplier: Set(input.supplier),
            location: Set(input.location),
            created_by: Set(input.created_by),
            created_by_id: Set(input.created_by_id),
            created_by_email: Set(input.created_by_email),
            ..Default::default()
        };
        if let Some(uom) = input.unit_of_measure {
            entry.unit_of_measure = Set(uom);
        }

        let created = entry
            .insert(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        if let Err(e) = self.event_sender.send(Event::ProductCreated(created.id)).await {
            warn!(error = %e, "failed to publish ProductCreated event");
        }

        info!(product_id = %created.id, sku = %created.sku, "created product");
        Ok(created)
    }

    #[instrument(skip(self), fields(%product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Page through the registry, newest first. `active_only` hides retired
    /// products.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        limit: u64,
        offset: u64,
        active_only: bool,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut base = Product::find();
        if active_only {
            base = base.filter(product::Column::IsActive.eq(true));
        }

        let total = base
            .clone()
            .count(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let products = base
            .order_by_desc(product::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok((products, total))
    }

    /// Active products whose projection sits at or below their configured
    /// minimum.
    #[instrument(skip(self))]
    pub async fn get_low_stock_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .filter(
                Condition::all()
                    .add(product::Column::IsActive.eq(true))
                    .add(product::Column::MinStockLevel.is_not_null())
                    .add(
                        Expr::col(product::Column::CurrentStock)
                            .lte(Expr::col(product::Column::MinStockLevel)),
                    ),
            )
            .order_by_asc(product::Column::CurrentStock)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, update), fields(%product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        update: ProductUpdate,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(product_id).await?;

        let mut entry: product::ActiveModel = existing.into();
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "name must not be blank".to_string(),
                ));
            }
            entry.name = Set(name.trim().to_string());
        }
        if let Some(description) = update.description {
            entry.description = Set(Some(description));
        }
        if let Some(category) = update.category {
            entry.category = Set(Some(category));
        }
        if let Some(uom) = update.unit_of_measure {
            entry.unit_of_measure = Set(uom);
        }
        if let Some(min_stock_level) = update.min_stock_level {
            entry.min_stock_level = Set(min_stock_level);
        }
        if let Some(max_stock_level) = update.max_stock_level {
            entry.max_stock_level = Set(max_stock_level);
        }
        if let Some(unit_cost) = update.unit_cost {
            entry.unit_cost = Set(unit_cost);
        }
        if let Some(supplier) = update.supplier {
            entry.supplier = Set(supplier);
        }
        if let Some(location) = update.location {
            entry.location = Set(location);
        }
        if let Some(is_active) = update.is_active {
            entry.is_active = Set(is_active);
        }

        let updated = entry
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        if let Err(e) = self.event_sender.send(Event::ProductUpdated(updated.id)).await {
            warn!(error = %e, "failed to publish ProductUpdated event");
        }

        info!(product_id = %updated.id, "updated product metadata");
        Ok(updated)
    }
}
