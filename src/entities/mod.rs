pub mod inventory_location;
pub mod product;
pub mod stock_transaction;

pub use inventory_location::LocationType;
pub use stock_transaction::{TransactionStatus, TransactionType};
