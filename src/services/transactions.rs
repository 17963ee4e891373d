use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as Product},
        stock_transaction::{self, Entity as StockTransaction, TransactionStatus, TransactionType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

static TRANSACTION_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^TXN-(\d{4})-(\d{2})-(\d+)$").expect("valid regex"));

/// Input for the ledger writer. Built by the HTTP layer from the request
/// payload, or synthesized internally by the reversal path.
#[derive(Debug, Clone)]
pub struct NewStockTransaction {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    /// Signed movement quantity; must be non-zero
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
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
    pub reference_number: Option<String>,
    pub batch_number: Option<String>,
    pub serial_numbers: Option<serde_json::Value>,
    pub expiry_date: Option<chrono::NaiveDate>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub external_system_id: Option<String>,
    pub external_system_name: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
}

impl NewStockTransaction {
    /// Minimal input with every optional field empty.
    pub fn new(
        product_id: Uuid,
        transaction_type: TransactionType,
        quantity: Decimal,
        transaction_done_by: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            transaction_type,
            quantity,
            unit_cost: None,
            from_location_id: None,
            from_location_name: None,
            to_location_id: None,
            to_location_name: None,
            project_id: None,
            project_name: None,
            transaction_done_by: transaction_done_by.into(),
            transaction_done_by_id: None,
            transaction_done_by_email: None,
            approval_required: false,
            approved_by: None,
            approved_by_id: None,
            reference_number: None,
            batch_number: None,
            serial_numbers: None,
            expiry_date: None,
            notes: None,
            reason: None,
            attachments: None,
            external_system_id: None,
            external_system_name: None,
            transaction_date: None,
        }
    }
}

/// What a write operation did: the ledger row, plus whether the product
/// projection moved and where it landed.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub transaction: stock_transaction::Model,
    pub stock_updated: bool,
    pub new_stock_level: Option<Decimal>,
}

/// Projection update performed alongside a ledger write.
#[derive(Debug, Clone)]
struct ProjectionChange {
    product: product::Model,
    stock_before: Decimal,
    stock_after: Decimal,
}

/// Apply the effect table to a starting stock level. Only OUT enforces
/// non-negativity: write-offs may push a product negative when more is
/// damaged than the ledger thought was on hand.
pub fn compute_stock_after(
    transaction_type: TransactionType,
    quantity: Decimal,
    stock_before: Decimal,
) -> Result<Decimal, ServiceError> {
    let stock_after = stock_before + transaction_type.signed_effect(quantity);

    if transaction_type == TransactionType::Out && stock_after < Decimal::ZERO {
        return Err(ServiceError::InsufficientStock {
            available: stock_before,
            requested: quantity,
        });
    }

    Ok(stock_after)
}

/// Render a transaction number for a (year, month) scope and sequence.
/// The width-4 zero padding is a minimum: sequences past 9999 keep all
/// their digits.
pub fn format_transaction_number(year: i32, month: u32, sequence: u32) -> String {
    format!("TXN-{:04}-{:02}-{:04}", year, month, sequence)
}

/// Extract the numeric sequence from a well-formed transaction number.
pub fn parse_sequence(transaction_number: &str) -> Option<u32> {
    TRANSACTION_NUMBER_RE
        .captures(transaction_number)
        .and_then(|caps| caps.get(3))
        .and_then(|m| m.as_str().parse().ok())
}

fn validate_input(input: &NewStockTransaction) -> Result<(), ServiceError> {
    if input.quantity.is_zero() {
        return Err(ServiceError::ValidationError(
            "quantity must be non-zero".to_string(),
        ));
    }
    if input.transaction_done_by.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "transaction_done_by is required".to_string(),
        ));
    }
    Ok(())
}

/// Allocate the next number in the current month's scope: numeric max of
/// the existing sequences plus one, starting at 0001. Rows with numbers
/// that do not parse are ignored rather than poisoning allocation. Must
/// run inside the write transaction so the product row lock serializes
/// competing allocations for the same product.
async fn next_transaction_number(
    txn: &DatabaseTransaction,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let prefix = format!("TXN-{:04}-{:02}-", now.year(), now.month());

    let numbers: Vec<String> = StockTransaction::find()
        .select_only()
        .column(stock_transaction::Column::TransactionNumber)
        .filter(stock_transaction::Column::TransactionNumber.starts_with(&prefix))
        .into_tuple()
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;

    let next_sequence = numbers
        .iter()
        .filter_map(|number| parse_sequence(number))
        .max()
        .unwrap_or(0)
        + 1;

    Ok(format_transaction_number(now.year(), now.month(), next_sequence))
}

/// Load a product inside a write transaction. On PostgreSQL the row is
/// locked with `FOR UPDATE`; SQLite has no row locks and its single-writer
/// transactions already serialize.
async fn load_product_for_update(
    txn: &DatabaseTransaction,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    let mut query = Product::find_by_id(product_id);
    if txn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }

    query
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
}

/// Load a ledger row for a status change, locked on PostgreSQL so that
/// concurrent reversals or approvals of the same row serialize.
async fn load_transaction_for_update(
    txn: &DatabaseTransaction,
    transaction_id: Uuid,
) -> Result<stock_transaction::Model, ServiceError> {
    let mut query = StockTransaction::find_by_id(transaction_id);
    if txn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }

    query
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Stock transaction {} not found", transaction_id))
        })
}

fn parse_stored_status(row: &stock_transaction::Model) -> Result<TransactionStatus, ServiceError> {
    TransactionStatus::from_str(&row.status).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Stock transaction {} has an unrecognized status {:?}",
            row.id, row.status
        ))
    })
}

fn parse_stored_type(row: &stock_transaction::Model) -> Result<TransactionType, ServiceError> {
    TransactionType::from_str(&row.transaction_type).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Stock transaction {} has an unrecognized type {:?}",
            row.id, row.transaction_type
        ))
    })
}

/// The writer algorithm: lock and load the product, compute the stock
/// snapshots, insert the ledger row, and move the projection when the row
/// lands completed. Runs entirely against the caller's transaction so the
/// reversal path can compose with it.
async fn write_ledger_entry(
    txn: &DatabaseTransaction,
    input: NewStockTransaction,
) -> Result<(stock_transaction::Model, Option<ProjectionChange>), ServiceError> {
    validate_input(&input)?;

    let product = load_product_for_update(txn, input.product_id).await?;

    let stock_before = product.current_stock;
    let stock_after = compute_stock_after(input.transaction_type, input.quantity, stock_before)?;

    let now = Utc::now();
    let status = if input.approval_required && input.approved_by.is_none() {
        TransactionStatus::Pending
    } else {
        TransactionStatus::Completed
    };
    let approved_at = input.approved_by.as_ref().map(|_| now);
    let total_value = input
        .unit_cost
        .map(|unit_cost| (input.quantity * unit_cost).round_dp(2));

    let transaction_number = next_transaction_number(txn, now).await?;

    let mut entry = stock_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        transaction_number: Set(transaction_number),
        transaction_type: Set(input.transaction_type.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        product_id: Set(input.product_id),
        quantity: Set(input.quantity),
        unit_cost: Set(input.unit_cost),
        total_value: Set(total_value),
        from_location_id: Set(input.from_location_id),
        from_location_name: Set(input.from_location_name),
        to_location_id: Set(input.to_location_id),
        to_location_name: Set(input.to_location_name),
        project_id: Set(input.project_id),
        project_name: Set(input.project_name),
        transaction_done_by: Set(input.transaction_done_by),
        transaction_done_by_id: Set(input.transaction_done_by_id),
        transaction_done_by_email: Set(input.transaction_done_by_email),
        approval_required: Set(input.approval_required),
        approved_by: Set(input.approved_by),
        approved_by_id: Set(input.approved_by_id),
        approved_at: Set(approved_at),
        stock_before: Set(stock_before),
        stock_after: Set(stock_after),
        reference_number: Set(input.reference_number),
        batch_number: Set(input.batch_number),
        serial_numbers: Set(input.serial_numbers),
        expiry_date: Set(input.expiry_date),
        notes: Set(input.notes),
        reason: Set(input.reason),
        attachments: Set(input.attachments),
        external_system_id: Set(input.external_system_id),
        external_system_name: Set(input.external_system_name),
        reversed_by_transaction_id: Set(None),
        ..Default::default()
    };
    if let Some(when) = input.transaction_date {
        entry.transaction_date = Set(when);
    }

    let transaction = entry.insert(txn).await.map_err(ServiceError::db_error)?;

    let projection = if status == TransactionStatus::Completed
        && input.transaction_type.affects_stock()
    {
        let mut product_update: product::ActiveModel = product.into();
        product_update.current_stock = Set(stock_after);
        let updated = product_update
            .update(txn)
            .await
            .map_err(ServiceError::db_error)?;
        Some(ProjectionChange {
            product: updated,
            stock_before,
            stock_after,
        })
    } else {
        None
    };

    info!(
        transaction_number = %transaction.transaction_number,
        product_id = %transaction.product_id,
        transaction_type = %transaction.transaction_type,
        status = %transaction.status,
        quantity = %transaction.quantity,
        %stock_before,
        %stock_after,
        "recorded stock transaction"
    );

    Ok((transaction, projection))
}

/// Owner of every ledger mutation: creation, reversal, and the approval
/// lifecycle. All writes happen inside database transactions with the
/// product row locked, so the ledger and the `current_stock` projection
/// cannot diverge.
#[derive(Clone)]
pub struct TransactionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl TransactionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Record a stock movement and, when it completes immediately, move the
    /// product's stock level with it.
    #[instrument(skip(self, input), fields(product_id = %input.product_id, transaction_type = input.transaction_type.as_str()))]
    pub async fn create_transaction(
        &self,
        input: NewStockTransaction,
    ) -> Result<TransactionOutcome, ServiceError> {
        let db = self.db_pool.as_ref();

        let (transaction, projection) = db
            .transaction::<_, (stock_transaction::Model, Option<ProjectionChange>), ServiceError>(
                move |txn| Box::pin(async move { write_ledger_entry(txn, input).await }),
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.publish_recorded(&transaction).await;
        if let Some(change) = &projection {
            self.publish_projection_change(transaction.id, change).await;
        }

        Ok(outcome(transaction, projection))
    }

    /// Compensate a completed transaction with a negated-quantity entry of
    /// the same type, and link the original to it. The compensating entry
    /// recomputes from the current stock level: it applies the inverse
    /// delta, it does not restore the pre-original value when other
    /// movements happened in between.
    #[instrument(skip(self, reversed_by, reason), fields(%transaction_id))]
    pub async fn reverse_transaction(
        &self,
        transaction_id: Uuid,
        reversed_by: String,
        reversed_by_id: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<TransactionOutcome, ServiceError> {
        if reversed_by.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "reversed_by is required".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();

        let (reversal, projection) = db
            .transaction::<_, (stock_transaction::Model, Option<ProjectionChange>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let original = load_transaction_for_update(txn, transaction_id).await?;

                        if original.reversed_by_transaction_id.is_some() {
                            return Err(ServiceError::AlreadyReversed(transaction_id));
                        }

                        match parse_stored_status(&original)? {
                            TransactionStatus::Reversed => {
                                return Err(ServiceError::AlreadyReversed(transaction_id))
                            }
                            TransactionStatus::Completed => {}
                            _ => {
                                return Err(ServiceError::InvalidStatus(format!(
                                    "Only completed transactions can be reversed; transaction {} is {}",
                                    original.transaction_number, original.status
                                )))
                            }
                        }

                        let transaction_type = parse_stored_type(&original)?;

                        let notes = format!(
                            "Reversal of transaction {}. Reason: {}",
                            original.transaction_number,
                            reason.as_deref().unwrap_or("No reason provided")
                        );
                        let reversal_reason =
                            reason.unwrap_or_else(|| "Transaction reversal".to_string());

                        let reversal_input = NewStockTransaction {
                            unit_cost: original.unit_cost,
                            transaction_done_by_id: reversed_by_id,
                            reference_number: Some(format!(
                                "REV-{}",
                                original.transaction_number
                            )),
                            notes: Some(notes),
                            reason: Some(reversal_reason),
                            ..NewStockTransaction::new(
                                original.product_id,
                                transaction_type,
                                -original.quantity,
                                reversed_by,
                            )
                        };

                        let (reversal, projection) =
                            write_ledger_entry(txn, reversal_input).await?;

                        let mut original_update: stock_transaction::ActiveModel = original.into();
                        original_update.status =
                            Set(TransactionStatus::Reversed.as_str().to_string());
                        original_update.reversed_by_transaction_id = Set(Some(reversal.id));
                        original_update
                            .update(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        Ok((reversal, projection))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.publish_recorded(&reversal).await;
        if let Some(change) = &projection {
            self.publish_projection_change(reversal.id, change).await;
        }
        if let Err(e) = self
            .event_sender
            .send(Event::TransactionReversed {
                original_transaction_id: transaction_id,
                reversal_transaction_id: reversal.id,
            })
            .await
        {
            warn!(error = %e, "failed to publish TransactionReversed event");
        }

        info!(
            original_transaction_id = %transaction_id,
            reversal_transaction_number = %reversal.transaction_number,
            "reversed stock transaction"
        );

        Ok(outcome(reversal, projection))
    }

    /// Complete a pending transaction. The stock effect is recomputed from
    /// the current level (same effect table and OUT guard as creation); the
    /// write-time snapshots on the row are left as they were.
    #[instrument(skip(self, approved_by), fields(%transaction_id))]
    pub async fn approve_transaction(
        &self,
        transaction_id: Uuid,
        approved_by: String,
        approved_by_id: Option<Uuid>,
    ) -> Result<TransactionOutcome, ServiceError> {
        if approved_by.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "approved_by is required".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();

        let (transaction, projection) = db
            .transaction::<_, (stock_transaction::Model, Option<ProjectionChange>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let pending = load_transaction_for_update(txn, transaction_id).await?;

                        if parse_stored_status(&pending)? != TransactionStatus::Pending {
                            return Err(ServiceError::InvalidStatus(format!(
                                "Only pending transactions can be approved; transaction {} is {}",
                                pending.transaction_number, pending.status
                            )));
                        }

                        let transaction_type = parse_stored_type(&pending)?;

                        let product = load_product_for_update(txn, pending.product_id).await?;
                        let stock_before = product.current_stock;
                        let stock_after =
                            compute_stock_after(transaction_type, pending.quantity, stock_before)?;

                        let mut approval: stock_transaction::ActiveModel = pending.into();
                        approval.status =
                            Set(TransactionStatus::Completed.as_str().to_string());
                        approval.approved_by = Set(Some(approved_by));
                        approval.approved_by_id = Set(approved_by_id);
                        approval.approved_at = Set(Some(Utc::now()));
                        let transaction = approval
                            .update(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        let projection = if transaction_type.affects_stock() {
                            let mut product_update: product::ActiveModel = product.into();
                            product_update.current_stock = Set(stock_after);
                            let updated = product_update
                                .update(txn)
                                .await
                                .map_err(ServiceError::db_error)?;
                            Some(ProjectionChange {
                                product: updated,
                                stock_before,
                                stock_after,
                            })
                        } else {
                            None
                        };

                        Ok((transaction, projection))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::TransactionApproved {
                transaction_id,
                approved_by: transaction.approved_by.clone().unwrap_or_default(),
            })
            .await
        {
            warn!(error = %e, "failed to publish TransactionApproved event");
        }
        if let Some(change) = &projection {
            self.publish_projection_change(transaction.id, change).await;
        }

        info!(
            transaction_number = %transaction.transaction_number,
            "approved stock transaction"
        );

        Ok(outcome(transaction, projection))
    }

    /// Cancel a pending transaction. Terminal, and never touches stock.
    #[instrument(skip(self, reason), fields(%transaction_id))]
    pub async fn cancel_transaction(
        &self,
        transaction_id: Uuid,
        reason: Option<String>,
    ) -> Result<stock_transaction::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let transaction = db
            .transaction::<_, stock_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let pending = load_transaction_for_update(txn, transaction_id).await?;

                    if parse_stored_status(&pending)? != TransactionStatus::Pending {
                        return Err(ServiceError::InvalidStatus(format!(
                            "Only pending transactions can be cancelled; transaction {} is {}",
                            pending.transaction_number, pending.status
                        )));
                    }

                    let merged_reason = match (&pending.reason, &reason) {
                        (Some(existing), Some(supplied)) => {
                            Some(format!("{}; cancelled: {}", existing, supplied))
                        }
                        (None, Some(supplied)) => Some(format!("Cancelled: {}", supplied)),
                        (existing, None) => existing.clone(),
                    };

                    let mut cancellation: stock_transaction::ActiveModel = pending.into();
                    cancellation.status =
                        Set(TransactionStatus::Cancelled.as_str().to_string());
                    cancellation.reason = Set(merged_reason);
                    cancellation
                        .update(txn)
                        .await
                        .map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::TransactionCancelled { transaction_id })
            .await
        {
            warn!(error = %e, "failed to publish TransactionCancelled event");
        }

        info!(
            transaction_number = %transaction.transaction_number,
            "cancelled stock transaction"
        );

        Ok(transaction)
    }

    async fn publish_recorded(&self, transaction: &stock_transaction::Model) {
        if let Err(e) = self
            .event_sender
            .send(Event::TransactionRecorded {
                transaction_id: transaction.id,
                transaction_number: transaction.transaction_number.clone(),
                product_id: transaction.product_id,
                transaction_type: transaction.transaction_type.clone(),
                status: transaction.status.clone(),
                quantity: transaction.quantity,
            })
            .await
        {
            warn!(error = %e, "failed to publish TransactionRecorded event");
        }
    }

    async fn publish_projection_change(&self, transaction_id: Uuid, change: &ProjectionChange) {
        if let Err(e) = self
            .event_sender
            .send(Event::StockLevelChanged {
                product_id: change.product.id,
                transaction_id,
                stock_before: change.stock_before,
                stock_after: change.stock_after,
            })
            .await
        {
            warn!(error = %e, "failed to publish StockLevelChanged event");
        }

        if let Some(min_stock_level) = change.product.min_stock_level {
            if change.product.current_stock <= min_stock_level {
                if let Err(e) = self
                    .event_sender
                    .send(Event::LowStockDetected {
                        product_id: change.product.id,
                        current_stock: change.product.current_stock,
                        min_stock_level,
                    })
                    .await
                {
                    warn!(error = %e, "failed to publish LowStockDetected event");
                }
            }
        }
    }
}

fn outcome(
    transaction: stock_transaction::Model,
    projection: Option<ProjectionChange>,
) -> TransactionOutcome {
    let stock_updated = projection.is_some();
    let new_stock_level = projection.map(|change| change.stock_after);
    TransactionOutcome {
        transaction,
        stock_updated,
        new_stock_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(TransactionType::In, dec!(10), dec!(10))]
    #[case(TransactionType::Return, dec!(10), dec!(10))]
    #[case(TransactionType::Adjustment, dec!(10), dec!(10))]
    #[case(TransactionType::Adjustment, dec!(-10), dec!(-10))]
    #[case(TransactionType::Out, dec!(10), dec!(-10))]
    #[case(TransactionType::Damaged, dec!(10), dec!(-10))]
    #[case(TransactionType::Expired, dec!(10), dec!(-10))]
    #[case(TransactionType::Transfer, dec!(10), dec!(0))]
    fn effect_table(
        #[case] transaction_type: TransactionType,
        #[case] quantity: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(transaction_type.signed_effect(quantity), expected);
    }

    #[rstest]
    #[case(TransactionType::In, dec!(110))]
    #[case(TransactionType::Return, dec!(110))]
    #[case(TransactionType::Adjustment, dec!(110))]
    #[case(TransactionType::Out, dec!(90))]
    #[case(TransactionType::Damaged, dec!(90))]
    #[case(TransactionType::Expired, dec!(90))]
    #[case(TransactionType::Transfer, dec!(100))]
    fn stock_after_from_one_hundred(
        #[case] transaction_type: TransactionType,
        #[case] expected: Decimal,
    ) {
        let stock_after = compute_stock_after(transaction_type, dec!(10), dec!(100))
            .expect("effect should apply");
        assert_eq!(stock_after, expected);
    }

    #[test]
    fn out_beyond_available_is_rejected_with_both_figures() {
        let err = compute_stock_after(TransactionType::Out, dec!(1000), dec!(40))
            .expect_err("overdraw must fail");

        assert_matches!(
            err,
            ServiceError::InsufficientStock { available, requested } => {
                assert_eq!(available, dec!(40));
                assert_eq!(requested, dec!(1000));
            }
        );
    }

    #[test]
    fn damaged_write_off_may_go_negative() {
        let stock_after = compute_stock_after(TransactionType::Damaged, dec!(15), dec!(10))
            .expect("write-offs are not guarded");
        assert_eq!(stock_after, dec!(-5));
    }

    #[test]
    fn transaction_numbers_format_and_parse() {
        assert_eq!(format_transaction_number(2024, 1, 1), "TXN-2024-01-0001");
        assert_eq!(format_transaction_number(2026, 12, 42), "TXN-2026-12-0042");
        assert_eq!(parse_sequence("TXN-2024-01-0001"), Some(1));
        assert_eq!(parse_sequence("TXN-2026-12-9999"), Some(9999));
    }

    #[test]
    fn sequences_past_the_pad_width_keep_all_digits() {
        let number = format_transaction_number(2024, 3, 10000);
        assert_eq!(number, "TXN-2024-03-10000");
        assert_eq!(parse_sequence(&number), Some(10000));
    }

    #[test]
    fn malformed_numbers_do_not_parse() {
        assert_eq!(parse_sequence("TXN-2024-1-0001"), None);
        assert_eq!(parse_sequence("TXN-2024-01-"), None);
        assert_eq!(parse_sequence("TXN-2024-01-12AB"), None);
        assert_eq!(parse_sequence("INV-2024-01-0001"), None);
    }

    #[test]
    fn zero_quantity_is_rejected_before_any_persistence() {
        let input = NewStockTransaction::new(
            Uuid::new_v4(),
            TransactionType::In,
            Decimal::ZERO,
            "Dana Operator",
        );
        assert_matches!(
            validate_input(&input),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn blank_actor_is_rejected() {
        let input =
            NewStockTransaction::new(Uuid::new_v4(), TransactionType::In, dec!(1), "   ");
        assert_matches!(
            validate_input(&input),
            Err(ServiceError::ValidationError(_))
        );
    }
}
