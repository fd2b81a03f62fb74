//! Call record DTOs

use crate::dto::common::PaginationParams;
use chrono::{DateTime, NaiveDate, Utc};
use meridian_core::models::{CallRecord, CallStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a call record
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCallRecordRequest {
    pub project_id: Uuid,

    pub expert_id: Uuid,

    pub project_expert_id: Option<Uuid>,

    /// Planned duration in minutes
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,

    pub call_date: Option<NaiveDate>,

    /// When present, the record is created directly in `scheduled`
    pub scheduled_start_time: Option<DateTime<Utc>>,

    pub scheduled_end_time: Option<DateTime<Utc>>,

    pub pm_id: Option<Uuid>,

    pub ra_id: Option<Uuid>,

    #[validate(url)]
    pub zoom_link: Option<String>,

    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// Request body for the schedule transition
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleCallRequest {
    pub scheduled_start_time: DateTime<Utc>,

    pub scheduled_end_time: DateTime<Utc>,

    #[validate(url)]
    pub zoom_link: Option<String>,
}

/// Request body for the complete transition
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompleteCallRequest {
    /// Actual duration in minutes; becomes the record's canonical duration
    #[validate(range(min = 1, max = 1440))]
    pub actual_duration_minutes: i32,

    #[validate(url)]
    pub recording_url: Option<String>,

    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// Request body for the cancel transition
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CancelCallRequest {
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

/// Request body for the generic update operation
///
/// Status is not part of this payload; transitions have their own routes.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCallRecordRequest {
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,

    pub call_date: Option<NaiveDate>,

    pub scheduled_start_time: Option<DateTime<Utc>>,

    pub scheduled_end_time: Option<DateTime<Utc>>,

    pub pm_id: Option<Uuid>,

    pub ra_id: Option<Uuid>,

    #[validate(url)]
    pub zoom_link: Option<String>,

    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// Query parameters for listing call records
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CallRecordFilterParams {
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,

    pub project_id: Option<Uuid>,

    pub expert_id: Option<Uuid>,

    pub status: Option<CallStatus>,
}

/// Call record API representation
#[derive(Debug, Clone, Serialize)]
pub struct CallRecordResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub project_expert_id: Option<Uuid>,
    pub pm_id: Option<Uuid>,
    pub ra_id: Option<Uuid>,
    pub duration_minutes: i32,
    pub actual_duration_minutes: Option<i32>,
    pub cu_used: Decimal,
    pub status: CallStatus,
    pub call_date: NaiveDate,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub recording_url: Option<String>,
    pub zoom_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CallRecord> for CallRecordResponse {
    fn from(record: CallRecord) -> Self {
        Self {
            id: record.id,
            project_id: record.project_id,
            expert_id: record.expert_id,
            project_expert_id: record.project_expert_id,
            pm_id: record.pm_id,
            ra_id: record.ra_id,
            duration_minutes: record.duration_minutes,
            actual_duration_minutes: record.actual_duration_minutes,
            cu_used: record.cu_used,
            status: record.status,
            call_date: record.call_date,
            scheduled_start_time: record.scheduled_start_time,
            scheduled_end_time: record.scheduled_end_time,
            completed_at: record.completed_at,
            notes: record.notes,
            recording_url: record.recording_url,
            zoom_link: record.zoom_link,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_validation() {
        let request = CreateCallRecordRequest {
            project_id: Uuid::new_v4(),
            expert_id: Uuid::new_v4(),
            project_expert_id: None,
            duration_minutes: 60,
            call_date: None,
            scheduled_start_time: None,
            scheduled_end_time: None,
            pm_id: None,
            ra_id: None,
            zoom_link: Some("https://zoom.example/j/123".to_string()),
            notes: None,
        };
        assert!(request.validate().is_ok());

        let invalid = CreateCallRecordRequest {
            duration_minutes: 0,
            ..request
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_complete_request_rejects_bad_url() {
        let request = CompleteCallRequest {
            actual_duration_minutes: 65,
            recording_url: Some("not a url".to_string()),
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_call_record_response_conversion() {
        let record = CallRecord {
            duration_minutes: 65,
            cu_used: dec!(1.25),
            status: CallStatus::Completed,
            completed_at: Some(Utc::now()),
            ..Default::default()
        };
        let id = record.id;

        let response = CallRecordResponse::from(record);
        assert_eq!(response.id, id);
        assert_eq!(response.cu_used, dec!(1.25));
        assert_eq!(response.status, CallStatus::Completed);
    }
}
