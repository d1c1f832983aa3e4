//! Business logic services for the Resto Stock back-office

pub mod audit;
pub mod catalog;
pub mod stock;
pub mod transaction;

pub use audit::AuditService;
pub use catalog::CatalogService;
pub use stock::StockService;
pub use transaction::TransactionService;
