use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Product entity
///
/// `current_stock` is a derived projection owned by the stock-transaction
/// ledger; registry updates never write it directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// SKU (Stock Keeping Unit)
    #[validate(length(
        min = 1,
        max = 100,
        message = "SKU must be between 1 and 100 characters"
    ))]
    pub sku: String,

    /// Product name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Product description
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    /// Category label, e.g. "electrical" or "consumables"
    #[validate(length(max = 100, message = "Category cannot exceed 100 characters"))]
    pub category: Option<String>,

    /// Unit the stock level is counted in (e.g. "unit", "kg", "m")
    #[validate(length(
        min = 1,
        max = 50,
        message = "Unit of measure must be between 1 and 50 characters"
    ))]
    pub unit_of_measure: String,

    /// Current stock level, maintained by completed ledger entries
    pub current_stock: Decimal,

    /// Threshold below which the product counts as low stock
    pub min_stock_level: Option<Decimal>,

    /// Upper bound used by replenishment planning
    pub max_stock_level: Option<Decimal>,

    /// Latest acquisition cost per unit
    pub unit_cost: Option<Decimal>,

    /// Preferred supplier
    pub supplier: Option<String>,

    /// Free-text home location
    pub location: Option<String>,

    /// Is the product active
    pub is_active: bool,

    /// Actor snapshot from creation
    pub created_by: Option<String>,
    pub created_by_id: Option<Uuid>,
    pub created_by_email: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Product entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_transaction::Entity")]
    StockTransactions,
}

impl Related<super::stock_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransactions.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }

            if let ActiveValue::NotSet = active_model.unit_of_measure {
                active_model.unit_of_measure = Set("unit".to_string());
            }

            if let ActiveValue::NotSet = active_model.current_stock {
                active_model.current_stock = Set(Decimal::ZERO);
            }

            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Utc::now());

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
