//! Expert model
//!
//! A subject-matter expert on the roster. The sourcing fields drive the
//! research associate incentive window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days after recruitment during which an expert's completed calls credit
/// the recruiting RA.
pub const SOURCING_WINDOW_DAYS: i64 = 60;

/// Expert entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expert {
    /// Unique identifier
    pub id: Uuid,

    /// Full name
    pub name: String,

    /// Contact email
    pub email: Option<String>,

    /// Current employer / title line shown to clients
    pub headline: Option<String>,

    /// Research associate who recruited this expert
    pub sourced_by_ra_id: Option<Uuid>,

    /// Recruitment timestamp
    pub sourced_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Expert {
    /// Whether a call completed at `completed_at` credits `ra_id`.
    ///
    /// The window is a continuous 60-day span from `sourced_at`, inclusive
    /// at the boundary: a completion at exactly sourced + 60 days still
    /// qualifies, one second later does not. Partial days count
    /// fractionally; this is not a calendar-day comparison.
    pub fn credits_ra(&self, ra_id: Uuid, completed_at: DateTime<Utc>) -> bool {
        match (self.sourced_by_ra_id, self.sourced_at) {
            (Some(sourced_by), Some(sourced_at)) if sourced_by == ra_id => {
                completed_at.signed_duration_since(sourced_at)
                    <= Duration::days(SOURCING_WINDOW_DAYS)
            }
            _ => false,
        }
    }
}

impl Default for Expert {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: None,
            headline: None,
            sourced_by_ra_id: None,
            sourced_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sourced_expert(ra_id: Uuid, sourced_at: DateTime<Utc>) -> Expert {
        Expert {
            sourced_by_ra_id: Some(ra_id),
            sourced_at: Some(sourced_at),
            ..Default::default()
        }
    }

    #[test]
    fn test_window_boundary_inclusive() {
        let ra_id = Uuid::new_v4();
        let sourced_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let expert = sourced_expert(ra_id, sourced_at);

        let exactly_60_days = sourced_at + Duration::days(60);
        assert!(expert.credits_ra(ra_id, exactly_60_days));

        let one_second_past = exactly_60_days + Duration::seconds(1);
        assert!(!expert.credits_ra(ra_id, one_second_past));
    }

    #[test]
    fn test_partial_days_count_fractionally() {
        let ra_id = Uuid::new_v4();
        let sourced_at = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let expert = sourced_expert(ra_id, sourced_at);

        // 59 days and 23 hours later is inside the window even though 60
        // calendar dates have been touched
        let inside = sourced_at + Duration::days(59) + Duration::hours(23);
        assert!(expert.credits_ra(ra_id, inside));
    }

    #[test]
    fn test_wrong_or_missing_ra_never_credits() {
        let ra_id = Uuid::new_v4();
        let other_ra = Uuid::new_v4();
        let sourced_at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let expert = sourced_expert(ra_id, sourced_at);
        assert!(!expert.credits_ra(other_ra, sourced_at + Duration::days(1)));

        let unsourced = Expert::default();
        assert!(!unsourced.credits_ra(ra_id, Utc::now()));

        let no_timestamp = Expert {
            sourced_by_ra_id: Some(ra_id),
            sourced_at: None,
            ..Default::default()
        };
        assert!(!no_timestamp.credits_ra(ra_id, Utc::now()));
    }
}
