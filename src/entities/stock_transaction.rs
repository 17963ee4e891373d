use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Types of stock movements recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    In,
    Out,
    Return,
    Adjustment,
    Transfer,
    Damaged,
    Expired,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Return => "RETURN",
            TransactionType::Adjustment => "ADJUSTMENT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Damaged => "DAMAGED",
            TransactionType::Expired => "EXPIRED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(TransactionType::In),
            "OUT" => Some(TransactionType::Out),
            "RETURN" => Some(TransactionType::Return),
            "ADJUSTMENT" => Some(TransactionType::Adjustment),
            "TRANSFER" => Some(TransactionType::Transfer),
            "DAMAGED" => Some(TransactionType::Damaged),
            "EXPIRED" => Some(TransactionType::Expired),
            _ => None,
        }
    }

    /// Transfers relocate stock without changing the product's level.
    pub fn affects_stock(&self) -> bool {
        !matches!(self, TransactionType::Transfer)
    }

    /// Signed stock delta this movement applies when it completes. The
    /// write-off types follow the quantity's sign, so a negated quantity
    /// (the reversal path) inverts the delta exactly.
    pub fn signed_effect(&self, quantity: Decimal) -> Decimal {
        match self {
            TransactionType::In | TransactionType::Return | TransactionType::Adjustment => quantity,
            TransactionType::Out | TransactionType::Damaged | TransactionType::Expired => -quantity,
            TransactionType::Transfer => Decimal::ZERO,
        }
    }
}

/// Lifecycle state of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
    Reversed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Reversed => "reversed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            "reversed" => Some(TransactionStatus::Reversed),
            _ => None,
        }
    }

    /// Legal lifecycle moves: pending may complete or cancel, completed may
    /// be reversed. Cancelled and reversed are terminal.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Completed)
                | (TransactionStatus::Pending, TransactionStatus::Cancelled)
                | (TransactionStatus::Completed, TransactionStatus::Reversed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Cancelled | TransactionStatus::Reversed
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable number, `TXN-YYYY-MM-NNNN`, sequence scoped to the
    /// calendar month of creation
    pub transaction_number: String,
    pub transaction_type: String, // Storing as string in DB, converted via TransactionType
    pub status: String,           // Converted via TransactionStatus
    pub product_id: Uuid,
    /// Signed movement quantity; reversals feed negated quantities back in
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub from_location_id: Option<Uuid>,
    pub from_location_name: Option<String>,
    pub to_location_id: Option<Uuid>,
    pub to_location_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub transaction_done_by: String,
    pub transaction_done_by_id: Option<Uuid>,
    pub transaction_done_by_email: Option<String>,
    pub approval_required: bool,
    pub approved_by: Option<String>,
    pub approved_by_id: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Stock level snapshots captured when the row was written; never
    /// recomputed afterwards
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub reference_number: Option<String>,
    pub batch_number: Option<String>,
    pub serial_numbers: Option<Json>,
    pub expiry_date: Option<Date>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub attachments: Option<Json>,
    pub external_system_id: Option<String>,
    pub external_system_name: Option<String>,
    pub reversed_by_transaction_id: Option<Uuid>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.transaction_date {
                active_model.transaction_date = Set(Utc::now());
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
        }

        active_model.updated_at = Set(Utc::now());

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn transaction_type_round_trips_through_db_representation() {
        for kind in TransactionType::iter() {
            assert_eq!(TransactionType::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionType::from_str("TELEPORT"), None);
        assert_eq!(TransactionType::from_str("in"), None);
    }

    #[test]
    fn transaction_status_round_trips_through_db_representation() {
        for status in TransactionStatus::iter() {
            assert_eq!(TransactionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TransactionStatus::from_str("COMPLETED"), None);
    }

    #[test]
    fn only_documented_status_transitions_are_legal() {
        use TransactionStatus::*;

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Reversed));

        assert!(!Pending.can_transition_to(Reversed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(!Reversed.can_transition_to(Completed));

        assert!(Cancelled.is_terminal());
        assert!(Reversed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Completed.is_terminal());
    }

    #[test]
    fn every_type_except_transfer_affects_stock() {
        for kind in TransactionType::iter() {
            assert_eq!(
                kind.affects_stock(),
                kind != TransactionType::Transfer,
                "unexpected stock effect flag for {:?}",
                kind
            );
        }
    }

    #[test]
    fn negating_the_quantity_inverts_every_effect() {
        let quantity = Decimal::new(7500, 3);
        for kind in TransactionType::iter() {
            assert_eq!(
                kind.signed_effect(quantity) + kind.signed_effect(-quantity),
                Decimal::ZERO,
                "effect of {:?} is not self-inverting",
                kind
            );
        }
    }
}
