//! User (employee) model
//!
//! Represents platform employees. The role determines which incentive
//! formula and call-filtering rule the monthly aggregator applies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Employee role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Research associate: sources experts, earns a capped per-call incentive
    #[default]
    Ra,
    /// Project manager: runs client projects, earns an uncapped per-CU incentive
    Pm,
    /// Administrator with company-wide visibility
    Admin,
    /// Finance: company-wide revenue visibility, no personal incentive
    Finance,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Ra => write!(f, "ra"),
            UserRole::Pm => write!(f, "pm"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Finance => write!(f, "finance"),
        }
    }
}

impl UserRole {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ra" => Some(UserRole::Ra),
            "pm" => Some(UserRole::Pm),
            "admin" => Some(UserRole::Admin),
            "finance" => Some(UserRole::Finance),
            _ => None,
        }
    }

    /// Back-office roles see company-wide figures and other employees'
    /// reports
    pub fn is_back_office(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Finance)
    }

    /// Whether this role may perform administrative removal
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,

    /// Email address (unique, used for login)
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Role driving KPI aggregation and access control
    pub role: UserRole,

    /// Whether the employee is active
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: String::new(),
            full_name: String::new(),
            role: UserRole::Ra,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Employee info for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub active: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.to_string(),
            active: user.active,
        }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo::from(&user)
    }
}
