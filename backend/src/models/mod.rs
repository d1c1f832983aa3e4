//! Database models for the Resto Stock back-office
//!
//! Re-exports models from the shared crate; backend-specific row types
//! live next to the services that query them.

pub use shared::models::*;
