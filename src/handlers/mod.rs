pub mod common;
pub mod locations;
pub mod products;
pub mod stock_transactions;

pub use crate::AppState;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{LedgerService, LocationService, ProductService, TransactionService},
};
use std::sync::Arc;

/// The service layer handed to every handler through [`AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub transactions: Arc<TransactionService>,
    pub ledger: Arc<LedgerService>,
    pub products: Arc<ProductService>,
    pub locations: Arc<LocationService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            transactions: Arc::new(TransactionService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            ledger: Arc::new(LedgerService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            locations: Arc::new(LocationService::new(db_pool, event_sender)),
        }
    }
}
