//! Atelier Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - [`ProfileRepository`](atelier_core::repository::ProfileRepository) and
//!   [`BrandRepository`](atelier_core::repository::BrandRepository)
//!   implementations in [`repository`]

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
