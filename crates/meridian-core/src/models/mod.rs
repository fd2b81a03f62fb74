//! Domain models for Meridian
//!
//! This module contains all the core domain models used throughout the application.

pub mod call_record;
pub mod expert;
pub mod project;
pub mod user;

pub use call_record::{CallRecord, CallStatus};
pub use expert::{Expert, SOURCING_WINDOW_DAYS};
pub use project::{Project, ProjectStatus};
pub use user::{User, UserInfo, UserRole};
