//! Call record model
//!
//! Represents a single consultation call between an expert and a project,
//! from scheduling through completion and billing.

use crate::billing::calculate_cu;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Call record status
///
/// `Pending` and `Scheduled` are live states; `Completed` and `Cancelled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Created without a confirmed time slot
    #[default]
    Pending,
    /// Time slot confirmed with the expert
    Scheduled,
    /// Call took place; actual duration recorded
    Completed,
    /// Call will not take place
    Cancelled,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Pending => write!(f, "pending"),
            CallStatus::Scheduled => write!(f, "scheduled"),
            CallStatus::Completed => write!(f, "completed"),
            CallStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl CallStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(CallStatus::Pending),
            "scheduled" => Some(CallStatus::Scheduled),
            "completed" => Some(CallStatus::Completed),
            "cancelled" => Some(CallStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Completed | CallStatus::Cancelled)
    }

    /// Whether a record in this status may receive a schedule window
    pub fn can_schedule(&self) -> bool {
        matches!(self, CallStatus::Pending | CallStatus::Scheduled)
    }

    /// Whether a record in this status may be completed
    pub fn can_complete(&self) -> bool {
        matches!(self, CallStatus::Scheduled)
    }

    /// Whether a record in this status may be cancelled
    pub fn can_cancel(&self) -> bool {
        matches!(self, CallStatus::Pending | CallStatus::Scheduled)
    }
}

/// Call record entity
///
/// `cu_used` is always derived from the authoritative duration for the
/// record's current status (actual duration once completed, planned duration
/// otherwise) via the CU calculator; callers never set it directly.
/// `completed_at` is non-null exactly when `status == Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Consulted expert
    pub expert_id: Uuid,

    /// Optional project-expert assignment link
    pub project_expert_id: Option<Uuid>,

    /// Project manager attributed for incentive purposes
    pub pm_id: Option<Uuid>,

    /// Research associate attributed at booking time
    pub ra_id: Option<Uuid>,

    /// Planned duration in minutes (overwritten with the actual duration
    /// on completion)
    pub duration_minutes: i32,

    /// Actual duration in minutes, recorded on completion
    pub actual_duration_minutes: Option<i32>,

    /// Billable Credit Units, derived from the authoritative duration
    pub cu_used: Decimal,

    /// Lifecycle status
    pub status: CallStatus,

    /// Business date of the call
    pub call_date: NaiveDate,

    /// Scheduled window start
    pub scheduled_start_time: Option<DateTime<Utc>>,

    /// Scheduled window end
    pub scheduled_end_time: Option<DateTime<Utc>>,

    /// Completion timestamp (set only on completion)
    pub completed_at: Option<DateTime<Utc>>,

    /// Free-form notes; cancellation reasons are appended here
    pub notes: Option<String>,

    /// Recording URL, supplied on completion
    pub recording_url: Option<String>,

    /// Conference link for the scheduled call
    pub zoom_link: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    /// The duration that is authoritative for billing in the current status
    pub fn billable_minutes(&self) -> i32 {
        match self.status {
            CallStatus::Completed => self.actual_duration_minutes.unwrap_or(self.duration_minutes),
            _ => self.duration_minutes,
        }
    }

    /// Re-derive `cu_used` from the authoritative duration
    pub fn recompute_cu(&mut self) {
        self.cu_used = calculate_cu(self.billable_minutes());
    }

    /// Whether this call counts toward revenue and incentive aggregation
    pub fn is_billable(&self) -> bool {
        self.status == CallStatus::Completed && self.completed_at.is_some()
    }
}

impl Default for CallRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            expert_id: Uuid::nil(),
            project_expert_id: None,
            pm_id: None,
            ra_id: None,
            duration_minutes: 0,
            actual_duration_minutes: None,
            cu_used: Decimal::ZERO,
            status: CallStatus::Pending,
            call_date: now.date_naive(),
            scheduled_start_time: None,
            scheduled_end_time: None,
            completed_at: None,
            notes: None,
            recording_url: None,
            zoom_link: None,
            created_at: now,
            updated_at: now,
        }
    }
}
