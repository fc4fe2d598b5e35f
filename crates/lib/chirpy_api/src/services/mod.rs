//! Business logic behind the handlers.

pub mod api_key;
pub mod auth;
