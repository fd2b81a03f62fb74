//! Meridian Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the Meridian CRM. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for all domain entities
//! - Atomic counter updates for project CU usage

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use meridian_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
