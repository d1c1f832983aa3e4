//! Domain models for the Resto Stock back-office

pub mod audit;
pub mod catalog;
pub mod stock;

pub use audit::*;
pub use catalog::*;
pub use stock::*;
