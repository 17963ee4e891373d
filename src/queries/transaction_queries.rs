use crate::{
    entities::stock_transaction::{
        self, Entity as StockTransaction, TransactionStatus, TransactionType,
    },
    errors::ServiceError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

/// Single-row fetch by id.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetTransactionQuery {
    pub transaction_id: Uuid,
}

#[async_trait]
impl Query for GetTransactionQuery {
    type Result = stock_transaction::Model;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        StockTransaction::find_by_id(self.transaction_id)
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Stock transaction {} not found",
                    self.transaction_id
                ))
            })
    }
}

/// One product's ledger, newest first, with the unpaginated total.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetProductTransactionHistoryQuery {
    pub product_id: Uuid,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
impl Query for GetProductTransactionHistoryQuery {
    type Result = (Vec<stock_transaction::Model>, u64);

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let base = StockTransaction::find()
            .filter(stock_transaction::Column::ProductId.eq(self.product_id));

        let total = base
            .clone()
            .count(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let transactions = base
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .limit(self.limit)
            .offset(self.offset)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((transactions, total))
    }
}

/// Latest movements across all products, optionally restricted to a set of
/// transaction types.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetRecentTransactionsQuery {
    pub limit: u64,
    pub types: Option<Vec<TransactionType>>,
}

#[async_trait]
impl Query for GetRecentTransactionsQuery {
    type Result = Vec<stock_transaction::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = StockTransaction::find();

        if let Some(types) = &self.types {
            if !types.is_empty() {
                query = query.filter(
                    stock_transaction::Column::TransactionType
                        .is_in(types.iter().map(|t| t.as_str())),
                );
            }
        }

        query
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .limit(self.limit)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Movements within an inclusive `transaction_date` window, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetTransactionsByDateRangeQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub types: Option<Vec<TransactionType>>,
    pub limit: u64,
}

#[async_trait]
impl Query for GetTransactionsByDateRangeQuery {
    type Result = Vec<stock_transaction::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = StockTransaction::find().filter(
            stock_transaction::Column::TransactionDate.between(self.start_date, self.end_date),
        );

        if let Some(types) = &self.types {
            if !types.is_empty() {
                query = query.filter(
                    stock_transaction::Column::TransactionType
                        .is_in(types.iter().map(|t| t.as_str())),
                );
            }
        }

        query
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .limit(self.limit)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionTypeBucket {
    pub transaction_type: String,
    pub count: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionStatusBucket {
    pub status: String,
    pub count: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionStats {
    pub total_transactions: u64,
    pub total_value: Decimal,
    pub by_type: Vec<TransactionTypeBucket>,
    pub by_status: Vec<TransactionStatusBucket>,
}

/// Ledger aggregates over an optional window and product: row count,
/// NULL-safe summed `total_value`, and the same pair grouped by type and
/// by status.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetTransactionStatsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub product_id: Option<Uuid>,
}

#[async_trait]
impl Query for GetTransactionStatsQuery {
    type Result = TransactionStats;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut base = StockTransaction::find();
        if let Some(start) = self.start_date {
            base = base.filter(stock_transaction::Column::TransactionDate.gte(start));
        }
        if let Some(end) = self.end_date {
            base = base.filter(stock_transaction::Column::TransactionDate.lte(end));
        }
        if let Some(product_id) = self.product_id {
            base = base.filter(stock_transaction::Column::ProductId.eq(product_id));
        }

        let totals: Option<(i64, Option<Decimal>)> = base
            .clone()
            .select_only()
            .column_as(
                Expr::col((stock_transaction::Entity, stock_transaction::Column::Id)).count(),
                "transaction_count",
            )
            .column_as(
                Expr::col((
                    stock_transaction::Entity,
                    stock_transaction::Column::TotalValue,
                ))
                .sum(),
                "value_sum",
            )
            .into_tuple()
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let (total_transactions, total_value) = match totals {
            Some((count, value)) => (count as u64, value.unwrap_or(Decimal::ZERO)),
            None => (0, Decimal::ZERO),
        };

        let type_rows: Vec<(String, i64, Option<Decimal>)> = base
            .clone()
            .select_only()
            .column(stock_transaction::Column::TransactionType)
            .column_as(
                Expr::col((stock_transaction::Entity, stock_transaction::Column::Id)).count(),
                "transaction_count",
            )
            .column_as(
                Expr::col((
                    stock_transaction::Entity,
                    stock_transaction::Column::TotalValue,
                ))
                .sum(),
                "value_sum",
            )
            .group_by(stock_transaction::Column::TransactionType)
            .order_by_asc(stock_transaction::Column::TransactionType)
            .into_tuple()
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let status_rows: Vec<(String, i64, Option<Decimal>)> = base
            .select_only()
            .column(stock_transaction::Column::Status)
            .column_as(
                Expr::col((stock_transaction::Entity, stock_transaction::Column::Id)).count(),
                "transaction_count",
            )
            .column_as(
                Expr::col((
                    stock_transaction::Entity,
                    stock_transaction::Column::TotalValue,
                ))
                .sum(),
                "value_sum",
            )
            .group_by(stock_transaction::Column::Status)
            .order_by_asc(stock_transaction::Column::Status)
            .into_tuple()
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let by_type = type_rows
            .into_iter()
            .map(|(transaction_type, count, value)| TransactionTypeBucket {
                transaction_type,
                count,
                total_value: value.unwrap_or(Decimal::ZERO),
            })
            .collect();

        let by_status = status_rows
            .into_iter()
            .map(|(status, count, value)| TransactionStatusBucket {
                status,
                count,
                total_value: value.unwrap_or(Decimal::ZERO),
            })
            .collect();

        Ok(TransactionStats {
            total_transactions,
            total_value,
            by_type,
            by_status,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StockReplay {
    pub replayed_stock: Decimal,
    pub entries: u64,
}

/// Recompute a product's stock level from the ledger. Completed rows and
/// reversed originals both applied their effect when they completed — the
/// compensating entry carries the inverse — so both stay in the replay;
/// pending and cancelled rows never touched stock and are excluded.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplayProductStockQuery {
    pub product_id: Uuid,
}

#[async_trait]
impl Query for ReplayProductStockQuery {
    type Result = StockReplay;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut stream = StockTransaction::find()
            .filter(stock_transaction::Column::ProductId.eq(self.product_id))
            .filter(stock_transaction::Column::Status.is_in([
                TransactionStatus::Completed.as_str(),
                TransactionStatus::Reversed.as_str(),
            ]))
            .stream(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let mut replayed_stock = Decimal::ZERO;
        let mut entries = 0u64;

        while let Some(row) = stream.try_next().await.map_err(ServiceError::db_error)? {
            match TransactionType::from_str(&row.transaction_type) {
                Some(kind) => {
                    replayed_stock += kind.signed_effect(row.quantity);
                    entries += 1;
                }
                None => {
                    warn!(
                        transaction_id = %row.id,
                        transaction_type = %row.transaction_type,
                        "skipping ledger row with unrecognized type during replay"
                    );
                }
            }
        }

        Ok(StockReplay {
            replayed_stock,
            entries,
        })
    }
}
