//! HTTP handlers for the Resto Stock back-office

pub mod audit;
pub mod catalog;
pub mod health;
pub mod stock;
pub mod transaction;

pub use audit::*;
pub use catalog::*;
pub use health::*;
pub use stock::*;
pub use transaction::*;
