//! JWT Claims structure
//!
//! Defines the claims structure used in JWT tokens for authentication.

use chrono::{Duration, Utc};
use meridian_core::models::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
///
/// Standard claims used in JWT tokens for employee authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (employee id)
    pub sub: Uuid,

    /// Employee role
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for the given employee
    ///
    /// # Examples
    ///
    /// ```
    /// use meridian_auth::Claims;
    /// use meridian_core::models::UserRole;
    /// use uuid::Uuid;
    ///
    /// let user_id = Uuid::new_v4();
    /// let claims = Claims::new(user_id, UserRole::Pm);
    /// assert_eq!(claims.sub, user_id);
    /// assert_eq!(claims.role, UserRole::Pm);
    /// ```
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: 0, // Will be set by JwtService
        }
    }

    /// Create new claims with custom expiration duration
    ///
    /// # Arguments
    ///
    /// * `user_id` - The employee id to include in the token
    /// * `role` - The employee's role
    /// * `expires_in_secs` - Token expiration time in seconds
    pub fn with_expiration(user_id: Uuid, role: UserRole, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        Self {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        self.exp <= now
    }

    /// Get the employee id from the claims
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Get the employee role
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Check if the employee belongs to back office (admin or finance)
    pub fn is_back_office(&self) -> bool {
        self.role.is_back_office()
    }

    /// Check if the employee has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
