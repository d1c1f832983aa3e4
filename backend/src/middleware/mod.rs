//! HTTP middleware for the Resto Stock back-office

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
