//! Project model
//!
//! A client engagement that owns call records and a running Credit-Unit
//! usage total.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Project status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Closed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Paused => write!(f, "paused"),
            ProjectStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Project entity
///
/// `total_cu_used` is a running counter incremented once per call record at
/// creation time. Increments happen as an atomic SQL expression at the
/// storage layer, never read-then-write in application code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Client display name
    pub client_name: String,

    /// Stable client organization reference, when linked
    pub client_organization_id: Option<Uuid>,

    /// Owning project manager
    pub pm_id: Option<Uuid>,

    /// Running CU usage counter
    pub total_cu_used: Decimal,

    /// USD billed per CU; falls back to the system default when absent
    pub cu_rate_per_cu: Option<Decimal>,

    /// Engagement status
    pub status: ProjectStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The USD rate applied to this project's calls
    pub fn effective_rate(&self) -> Decimal {
        self.cu_rate_per_cu
            .unwrap_or(crate::billing::DEFAULT_CU_RATE_PER_CU)
    }
}

impl Default for Project {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            client_name: String::new(),
            client_organization_id: None,
            pm_id: None,
            total_cu_used: Decimal::ZERO,
            cu_rate_per_cu: None,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_effective_rate_defaults() {
        let project = Project::default();
        assert_eq!(project.effective_rate(), dec!(1150));

        let project = Project {
            cu_rate_per_cu: Some(dec!(1000)),
            ..Default::default()
        };
        assert_eq!(project.effective_rate(), dec!(1000));
    }
}
