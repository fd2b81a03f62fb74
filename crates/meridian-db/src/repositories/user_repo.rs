//! User repository implementation
//!
//! PostgreSQL-backed storage for platform employees.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::{
    models::{User, UserRole},
    traits::{Repository, UserRepository},
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_SELECT_COLUMNS: &str = r#"
    id, email, full_name, role, active, created_at, updated_at
"#;

#[async_trait]
impl Repository<User, Uuid> for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_SELECT_COLUMNS);

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user {}: {}", id, e);
                AppError::Database(format!("Failed to find user: {}", e))
            })?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY full_name LIMIT $1 OFFSET $2",
            USER_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing users: {}", e);
                AppError::Database(format!("Failed to fetch users: {}", e))
            })?;

        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting users: {}", e);
                AppError::Database(format!("Failed to count users: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &User) -> AppResult<User> {
        debug!("Creating user: {}", entity.email);

        let query = format!(
            r#"
            INSERT INTO users (id, email, full_name, role, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(entity.id)
            .bind(&entity.email)
            .bind(&entity.full_name)
            .bind(entity.role.to_string())
            .bind(entity.active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating user: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::AlreadyExists(format!("User {} already exists", entity.email))
                } else {
                    AppError::Database(format!("Failed to create user: {}", e))
                }
            })?;

        User::try_from(row)
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &User) -> AppResult<User> {
        debug!("Updating user: {}", entity.id);

        let query = format!(
            r#"
            UPDATE users
            SET email = $2,
                full_name = $3,
                role = $4,
                active = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(entity.id)
            .bind(&entity.email)
            .bind(&entity.full_name)
            .bind(entity.role.to_string())
            .bind(entity.active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating user {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update user: {}", e))
            })?;

        User::try_from(row)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting user {}: {}", id, e);
                AppError::Database(format!("Failed to delete user: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_SELECT_COLUMNS);

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user by email: {}", e);
                AppError::Database(format!("Failed to find user: {}", e))
            })?;

        row.map(User::try_from).transpose()
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::from_str(&row.role)
            .ok_or_else(|| AppError::Database(format!("Unknown user role: {}", row.role)))?;

        Ok(Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_conversion() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "ra@meridian.example".to_string(),
            full_name: "Sam Okafor".to_string(),
            role: "ra".to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };

        let user = User::try_from(row).unwrap();
        assert_eq!(user.role, UserRole::Ra);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            email: String::new(),
            full_name: String::new(),
            role: "contractor".to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(User::try_from(row).is_err());
    }
}
