//! Repository implementations
//!
//! This module contains concrete implementations of all repository traits
//! defined in meridian-core, using sqlx for PostgreSQL access.

pub mod call_record_repo;
pub mod expert_repo;
pub mod project_repo;
pub mod user_repo;

pub use call_record_repo::PgCallRecordRepository;
pub use expert_repo::PgExpertRepository;
pub use project_repo::PgProjectRepository;
pub use user_repo::PgUserRepository;
