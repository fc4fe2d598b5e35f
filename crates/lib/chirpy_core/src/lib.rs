//! # chirpy_core
//!
//! Core authentication and session logic for Chirpy: password hashing,
//! access token signing, and refresh session / user storage.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod sessions;
pub mod users;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
