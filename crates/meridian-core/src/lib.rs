//! Meridian Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Meridian expert-network CRM. It includes:
//!
//! - Domain models (Project, Expert, CallRecord, User)
//! - Credit-Unit billing arithmetic
//! - Common traits for repositories
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod billing;
pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
