use crate::{
    db::DbPool,
    entities::{
        product::Entity as Product,
        stock_transaction::{self, TransactionType},
    },
    errors::ServiceError,
    queries::transaction_queries::{
        GetProductTransactionHistoryQuery, GetRecentTransactionsQuery, GetTransactionQuery,
        GetTransactionStatsQuery, GetTransactionsByDateRangeQuery, Query, ReplayProductStockQuery,
        TransactionStats,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;
pub const DEFAULT_RECENT_LIMIT: u64 = 20;
pub const DEFAULT_RANGE_LIMIT: u64 = 1000;

/// A page of one product's ledger. `error` carries the fail-closed
/// explanation when the rows could not be read.
#[derive(Debug, Clone, Default)]
pub struct TransactionPage {
    pub transactions: Vec<stock_transaction::Model>,
    pub total: u64,
    pub error: Option<String>,
}

/// An unpaginated list result with the same fail-closed contract.
#[derive(Debug, Clone, Default)]
pub struct TransactionList {
    pub transactions: Vec<stock_transaction::Model>,
    pub error: Option<String>,
}

/// Aggregates plus the fail-closed error slot.
#[derive(Debug, Clone, Default)]
pub struct TransactionStatsResult {
    pub stats: TransactionStats,
    pub error: Option<String>,
}

/// Outcome of replaying a product's ledger against its stored projection.
#[derive(Debug, Clone)]
pub struct StockVerification {
    pub product_id: Uuid,
    pub stored_stock: Decimal,
    pub replayed_stock: Decimal,
    pub entries_replayed: u64,
    pub consistent: bool,
}

/// Read-only view over the ledger. The list and stats operations fail
/// closed: a persistence error is logged and surfaced as an empty result
/// with an error string, never as a failed call, so callers can still
/// render a partial view. Single-row fetches and the reconciliation check
/// return typed errors like the write paths do.
#[derive(Clone)]
pub struct LedgerService {
    db_pool: Arc<DbPool>,
}

impl LedgerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self), fields(%product_id))]
    pub async fn get_product_transaction_history(
        &self,
        product_id: Uuid,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> TransactionPage {
        let query = GetProductTransactionHistoryQuery {
            product_id,
            limit: limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            offset: offset.unwrap_or(0),
        };

        match query.execute(self.db_pool.as_ref()).await {
            Ok((transactions, total)) => TransactionPage {
                transactions,
                total,
                error: None,
            },
            Err(e) => {
                error!(%product_id, error = %e, "failed to read product transaction history");
                TransactionPage {
                    transactions: Vec::new(),
                    total: 0,
                    error: Some(e.response_message()),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_recent_transactions(
        &self,
        limit: Option<u64>,
        types: Option<Vec<TransactionType>>,
    ) -> TransactionList {
        let query = GetRecentTransactionsQuery {
            limit: limit.unwrap_or(DEFAULT_RECENT_LIMIT),
            types,
        };

        match query.execute(self.db_pool.as_ref()).await {
            Ok(transactions) => TransactionList {
                transactions,
                error: None,
            },
            Err(e) => {
                error!(error = %e, "failed to read recent transactions");
                TransactionList {
                    transactions: Vec::new(),
                    error: Some(e.response_message()),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_transactions_by_date_range(
        &self,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        types: Option<Vec<TransactionType>>,
        limit: Option<u64>,
    ) -> TransactionList {
        let query = GetTransactionsByDateRangeQuery {
            start_date,
            end_date,
            types,
            limit: limit.unwrap_or(DEFAULT_RANGE_LIMIT),
        };

        match query.execute(self.db_pool.as_ref()).await {
            Ok(transactions) => TransactionList {
                transactions,
                error: None,
            },
            Err(e) => {
                error!(error = %e, "failed to read transactions by date range");
                TransactionList {
                    transactions: Vec::new(),
                    error: Some(e.response_message()),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_transaction_stats(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        product_id: Option<Uuid>,
    ) -> TransactionStatsResult {
        let query = GetTransactionStatsQuery {
            start_date,
            end_date,
            product_id,
        };

        match query.execute(self.db_pool.as_ref()).await {
            Ok(stats) => TransactionStatsResult { stats, error: None },
            Err(e) => {
                error!(error = %e, "failed to compute transaction stats");
                TransactionStatsResult {
                    stats: TransactionStats::default(),
                    error: Some(e.response_message()),
                }
            }
        }
    }

    #[instrument(skip(self), fields(%transaction_id))]
    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<stock_transaction::Model, ServiceError> {
        GetTransactionQuery { transaction_id }
            .execute(self.db_pool.as_ref())
            .await
    }

    /// Replay the product's ledger and compare the result against the
    /// stored `current_stock` projection.
    #[instrument(skip(self), fields(%product_id))]
    pub async fn verify_product_stock(
        &self,
        product_id: Uuid,
    ) -> Result<StockVerification, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let replay = ReplayProductStockQuery { product_id }
            .execute(self.db_pool.as_ref())
            .await?;

        Ok(StockVerification {
            product_id,
            stored_stock: product.current_stock,
            replayed_stock: replay.replayed_stock,
            entries_replayed: replay.entries,
            consistent: product.current_stock == replay.replayed_stock,
        })
    }
}
