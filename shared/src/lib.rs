//! Shared types and models for the Resto Stock back-office
//!
//! This crate contains types shared between the backend and any client
//! components (terminal front-ends, import tooling) of the system.

pub mod edit_buffer;
pub mod models;
pub mod types;
pub mod validation;

pub use edit_buffer::*;
pub use models::*;
pub use types::*;
pub use validation::*;
