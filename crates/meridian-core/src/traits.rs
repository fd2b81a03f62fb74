//! Common traits for repositories
//!
//! Defines abstractions for database access so services can be tested
//! against in-memory fakes.

use crate::error::AppError;
use crate::models::{CallRecord, CallStatus, Expert, Project, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    /// Count total entities
    async fn count(&self) -> Result<i64, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// Call record repository trait with specialized methods
#[async_trait]
pub trait CallRecordRepository: Repository<CallRecord, Uuid> {
    /// All completed calls with `completed_at` in `[start, end)`
    async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CallRecord>, AppError>;

    /// List call records with filtering
    async fn list_filtered(
        &self,
        project_id: Option<Uuid>,
        expert_id: Option<Uuid>,
        status: Option<CallStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CallRecord>, i64), AppError>;
}

/// Project repository trait with specialized methods
#[async_trait]
pub trait ProjectRepository: Repository<Project, Uuid> {
    /// Atomically add `delta` to the project's running CU counter.
    ///
    /// Implementations must perform the increment as a single storage-layer
    /// expression, not read-then-write, so concurrent call creations cannot
    /// lose updates.
    async fn increment_total_cu(&self, id: Uuid, delta: Decimal) -> Result<Decimal, AppError>;

    /// Batch lookup for report enrichment
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Project>, AppError>;
}

/// Expert repository trait with specialized methods
#[async_trait]
pub trait ExpertRepository: Repository<Expert, Uuid> {
    /// Batch lookup for report enrichment
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Expert>, AppError>;

    /// Experts recruited by the given research associate
    async fn list_sourced_by(&self, ra_id: Uuid) -> Result<Vec<Expert>, AppError>;
}

/// User repository trait with specialized methods
#[async_trait]
pub trait UserRepository: Repository<User, Uuid> {
    /// Find user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 1000),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
