// Ledger write and read paths
pub mod ledger;
pub mod transactions;

// Registries the ledger projects onto and references
pub mod locations;
pub mod products;

pub use ledger::LedgerService;
pub use locations::LocationService;
pub use products::ProductService;
pub use transactions::TransactionService;
