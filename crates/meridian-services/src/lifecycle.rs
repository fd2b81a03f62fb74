//! Call record lifecycle service
//!
//! Implements the consultation-call state machine (pending → scheduled →
//! completed/cancelled) and keeps `cu_used` derived from the authoritative
//! duration at every transition. Creating a record also bumps the owning
//! project's running CU counter through the repository's atomic increment.

use chrono::{DateTime, NaiveDate, Utc};
use meridian_core::{
    billing::calculate_cu,
    models::{CallRecord, CallStatus},
    traits::{CallRecordRepository, ExpertRepository, Pagination, ProjectRepository},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Input for creating a call record
#[derive(Debug, Clone, Default)]
pub struct CreateCallInput {
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub project_expert_id: Option<Uuid>,
    pub duration_minutes: i32,
    pub call_date: Option<NaiveDate>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub pm_id: Option<Uuid>,
    pub ra_id: Option<Uuid>,
    pub zoom_link: Option<String>,
    pub notes: Option<String>,
}

/// Patch for the generic update operation
///
/// Status is deliberately absent: transitions go through `schedule`,
/// `complete` and `cancel` only.
#[derive(Debug, Clone, Default)]
pub struct UpdateCallInput {
    pub duration_minutes: Option<i32>,
    pub call_date: Option<NaiveDate>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub pm_id: Option<Uuid>,
    pub ra_id: Option<Uuid>,
    pub zoom_link: Option<String>,
    pub notes: Option<String>,
}

/// Call lifecycle service
///
/// Generic over the repository traits so the state machine can be tested
/// against in-memory fakes.
pub struct CallLifecycleService<C, P, E>
where
    C: CallRecordRepository,
    P: ProjectRepository,
    E: ExpertRepository,
{
    call_repo: Arc<C>,
    project_repo: Arc<P>,
    expert_repo: Arc<E>,
}

impl<C, P, E> CallLifecycleService<C, P, E>
where
    C: CallRecordRepository,
    P: ProjectRepository,
    E: ExpertRepository,
{
    /// Create a new lifecycle service
    pub fn new(call_repo: Arc<C>, project_repo: Arc<P>, expert_repo: Arc<E>) -> Self {
        Self {
            call_repo,
            project_repo,
            expert_repo,
        }
    }

    /// Create a call record
    ///
    /// Initial status is `scheduled` when a start time is supplied, else
    /// `pending`. `cu_used` is derived from the planned duration, and the
    /// owning project's `total_cu_used` is incremented by that value.
    #[instrument(skip(self, input), fields(project_id = %input.project_id, expert_id = %input.expert_id))]
    pub async fn create(&self, input: CreateCallInput) -> AppResult<CallRecord> {
        // Both referenced entities must exist before any mutation
        self.project_repo
            .find_by_id(input.project_id)
            .await?
            .ok_or_else(|| AppError::ProjectNotFound(input.project_id.to_string()))?;

        self.expert_repo
            .find_by_id(input.expert_id)
            .await?
            .ok_or_else(|| AppError::ExpertNotFound(input.expert_id.to_string()))?;

        let status = if input.scheduled_start_time.is_some() {
            CallStatus::Scheduled
        } else {
            CallStatus::Pending
        };

        let cu_used = calculate_cu(input.duration_minutes);
        let now = Utc::now();

        let record = CallRecord {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            expert_id: input.expert_id,
            project_expert_id: input.project_expert_id,
            pm_id: input.pm_id,
            ra_id: input.ra_id,
            duration_minutes: input.duration_minutes,
            actual_duration_minutes: None,
            cu_used,
            status,
            call_date: input.call_date.unwrap_or_else(|| now.date_naive()),
            scheduled_start_time: input.scheduled_start_time,
            scheduled_end_time: input.scheduled_end_time,
            completed_at: None,
            notes: input.notes,
            recording_url: None,
            zoom_link: input.zoom_link,
            created_at: now,
            updated_at: now,
        };

        let created = self.call_repo.create(&record).await?;

        // Aggregate is bumped once, at creation, with the planned CU.
        // Completion does not re-adjust it.
        let total = self
            .project_repo
            .increment_total_cu(created.project_id, created.cu_used)
            .await?;

        info!(
            call_id = %created.id,
            cu_used = %created.cu_used,
            project_total_cu = %total,
            "Call record created"
        );

        Ok(created)
    }

    /// Fetch a single record
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<CallRecord> {
        self.call_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CallRecordNotFound(id.to_string()))
    }

    /// List records with optional filters
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        project_id: Option<Uuid>,
        expert_id: Option<Uuid>,
        status: Option<CallStatus>,
        pagination: Pagination,
    ) -> AppResult<(Vec<CallRecord>, i64)> {
        self.call_repo
            .list_filtered(
                project_id,
                expert_id,
                status,
                pagination.limit(),
                pagination.offset(),
            )
            .await
    }

    /// Confirm (or move) the scheduled window of a record
    ///
    /// Allowed from `pending` and `scheduled`; re-scheduling an already
    /// scheduled record simply replaces the window.
    #[instrument(skip(self))]
    pub async fn schedule(
        &self,
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        zoom_link: Option<String>,
    ) -> AppResult<CallRecord> {
        let mut record = self.get(id).await?;

        if !record.status.can_schedule() {
            warn!(call_id = %id, status = %record.status, "Schedule rejected");
            return Err(AppError::InvalidTransition(format!(
                "cannot schedule a {} call",
                record.status
            )));
        }

        record.status = CallStatus::Scheduled;
        record.scheduled_start_time = Some(start);
        record.scheduled_end_time = Some(end);
        if zoom_link.is_some() {
            record.zoom_link = zoom_link;
        }
        record.updated_at = Utc::now();

        self.call_repo.update(&record).await
    }

    /// Complete a scheduled call
    ///
    /// Overwrites the planned duration with the actual one, re-derives
    /// `cu_used`, and stamps `completed_at`. The project aggregate keeps the
    /// value added at creation time.
    #[instrument(skip(self))]
    pub async fn complete(
        &self,
        id: Uuid,
        actual_duration_minutes: i32,
        recording_url: Option<String>,
        notes: Option<String>,
    ) -> AppResult<CallRecord> {
        let mut record = self.get(id).await?;

        if !record.status.can_complete() {
            warn!(call_id = %id, status = %record.status, "Complete rejected");
            return Err(AppError::InvalidTransition(format!(
                "cannot complete a {} call",
                record.status
            )));
        }

        let now = Utc::now();
        record.status = CallStatus::Completed;
        record.duration_minutes = actual_duration_minutes;
        record.actual_duration_minutes = Some(actual_duration_minutes);
        record.recompute_cu();
        record.completed_at = Some(now);
        if recording_url.is_some() {
            record.recording_url = recording_url;
        }
        if let Some(extra) = notes {
            record.notes = Some(match record.notes.take() {
                Some(existing) => format!("{}\n{}", existing, extra),
                None => extra,
            });
        }
        record.updated_at = now;

        let updated = self.call_repo.update(&record).await?;

        info!(
            call_id = %updated.id,
            cu_used = %updated.cu_used,
            "Call record completed"
        );

        Ok(updated)
    }

    /// Cancel a pending or scheduled call
    ///
    /// Cancelling an already-cancelled record is a no-op that returns the
    /// record unchanged. CU is left as originally computed; cancelled calls
    /// never enter revenue or incentive aggregation.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid, reason: Option<String>) -> AppResult<CallRecord> {
        let mut record = self.get(id).await?;

        if record.status == CallStatus::Cancelled {
            debug!(call_id = %id, "Cancel on already-cancelled record is a no-op");
            return Ok(record);
        }

        if !record.status.can_cancel() {
            warn!(call_id = %id, status = %record.status, "Cancel rejected");
            return Err(AppError::InvalidTransition(format!(
                "cannot cancel a {} call",
                record.status
            )));
        }

        record.status = CallStatus::Cancelled;
        if let Some(reason) = reason {
            record.notes = Some(match record.notes.take() {
                Some(existing) => format!("{}\nCancelled: {}", existing, reason),
                None => format!("Cancelled: {}", reason),
            });
        }
        record.updated_at = Utc::now();

        self.call_repo.update(&record).await
    }

    /// Generic field update
    ///
    /// Re-derives `cu_used` whenever the duration changes. Status is not
    /// mutable through this path.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: Uuid, patch: UpdateCallInput) -> AppResult<CallRecord> {
        let mut record = self.get(id).await?;

        let mut duration_changed = false;

        if let Some(minutes) = patch.duration_minutes {
            if minutes != record.duration_minutes {
                record.duration_minutes = minutes;
                duration_changed = true;
            }
        }
        if let Some(date) = patch.call_date {
            record.call_date = date;
        }
        if patch.scheduled_start_time.is_some() {
            record.scheduled_start_time = patch.scheduled_start_time;
        }
        if patch.scheduled_end_time.is_some() {
            record.scheduled_end_time = patch.scheduled_end_time;
        }
        if patch.pm_id.is_some() {
            record.pm_id = patch.pm_id;
        }
        if patch.ra_id.is_some() {
            record.ra_id = patch.ra_id;
        }
        if patch.zoom_link.is_some() {
            record.zoom_link = patch.zoom_link;
        }
        if patch.notes.is_some() {
            record.notes = patch.notes;
        }

        if duration_changed {
            record.recompute_cu();
        }
        record.updated_at = Utc::now();

        self.call_repo.update(&record).await
    }

    /// Administrative, irreversible removal
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.call_repo.delete(id).await?;
        if !deleted {
            return Err(AppError::CallRecordNotFound(id.to_string()));
        }
        info!(call_id = %id, "Call record removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCallRepo, MockExpertRepo, MockProjectRepo};
    use meridian_core::models::{Expert, Project};
    use rust_decimal_macros::dec;

    fn service_with(
        projects: Vec<Project>,
        experts: Vec<Expert>,
    ) -> CallLifecycleService<MockCallRepo, MockProjectRepo, MockExpertRepo> {
        CallLifecycleService::new(
            Arc::new(MockCallRepo::default()),
            Arc::new(MockProjectRepo::with(projects)),
            Arc::new(MockExpertRepo::with(experts)),
        )
    }

    fn project() -> Project {
        Project::default()
    }

    fn expert() -> Expert {
        Expert::default()
    }

    #[tokio::test]
    async fn test_create_pending_without_start_time() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 45,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(record.status, CallStatus::Pending);
        assert_eq!(record.cu_used, dec!(0.75));
    }

    #[tokio::test]
    async fn test_create_scheduled_with_start_time() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 60,
                scheduled_start_time: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(record.status, CallStatus::Scheduled);
        assert_eq!(record.cu_used, dec!(1));
    }

    #[tokio::test]
    async fn test_create_increments_project_aggregate() {
        let p = project();
        let e = expert();
        let project_repo = Arc::new(MockProjectRepo::with(vec![p.clone()]));
        let service = CallLifecycleService::new(
            Arc::new(MockCallRepo::default()),
            project_repo.clone(),
            Arc::new(MockExpertRepo::with(vec![e.clone()])),
        );

        service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 50,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(project_repo.total_cu(p.id), dec!(1));
    }

    #[tokio::test]
    async fn test_create_unknown_project_is_not_found() {
        let e = expert();
        let service = service_with(vec![], vec![e.clone()]);

        let result = service
            .create(CreateCallInput {
                project_id: Uuid::new_v4(),
                expert_id: e.id,
                duration_minutes: 30,
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_unknown_expert_is_not_found() {
        let p = project();
        let service = service_with(vec![p.clone()], vec![]);

        let result = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: Uuid::new_v4(),
                duration_minutes: 30,
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::ExpertNotFound(_))));
    }

    #[tokio::test]
    async fn test_schedule_from_pending() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 30,
                ..Default::default()
            })
            .await
            .unwrap();

        let start = Utc::now();
        let end = start + chrono::Duration::minutes(30);
        let scheduled = service
            .schedule(record.id, start, end, Some("https://zoom.example/j/1".into()))
            .await
            .unwrap();

        assert_eq!(scheduled.status, CallStatus::Scheduled);
        assert_eq!(scheduled.scheduled_start_time, Some(start));
        assert_eq!(scheduled.scheduled_end_time, Some(end));
        assert!(scheduled.zoom_link.is_some());
    }

    #[tokio::test]
    async fn test_complete_overwrites_duration_and_recomputes_cu() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 50,
                scheduled_start_time: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(record.cu_used, dec!(1));

        let completed = service.complete(record.id, 65, None, None).await.unwrap();

        assert_eq!(completed.status, CallStatus::Completed);
        assert_eq!(completed.duration_minutes, 65);
        assert_eq!(completed.actual_duration_minutes, Some(65));
        assert_eq!(completed.cu_used, dec!(1.25));
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_complete_does_not_readjust_project_aggregate() {
        let p = project();
        let e = expert();
        let project_repo = Arc::new(MockProjectRepo::with(vec![p.clone()]));
        let service = CallLifecycleService::new(
            Arc::new(MockCallRepo::default()),
            project_repo.clone(),
            Arc::new(MockExpertRepo::with(vec![e.clone()])),
        );

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 50,
                scheduled_start_time: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(project_repo.total_cu(p.id), dec!(1));

        service.complete(record.id, 65, None, None).await.unwrap();

        // Aggregate keeps the planned-duration CU added at creation
        assert_eq!(project_repo.total_cu(p.id), dec!(1));
    }

    #[tokio::test]
    async fn test_complete_rejected_from_pending() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 30,
                ..Default::default()
            })
            .await
            .unwrap();

        let result = service.complete(record.id, 30, None, None).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_cancel_appends_reason_to_notes() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 30,
                notes: Some("prep done".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let cancelled = service
            .cancel(record.id, Some("expert unavailable".into()))
            .await
            .unwrap();

        assert_eq!(cancelled.status, CallStatus::Cancelled);
        let notes = cancelled.notes.unwrap();
        assert!(notes.contains("prep done"));
        assert!(notes.contains("expert unavailable"));
        // CU stays as originally computed
        assert_eq!(cancelled.cu_used, dec!(0.5));
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 30,
                ..Default::default()
            })
            .await
            .unwrap();

        let first = service.cancel(record.id, Some("reason".into())).await.unwrap();
        let second = service.cancel(record.id, Some("other".into())).await.unwrap();

        // No-op: no field changes on the second cancel
        assert_eq!(second.status, CallStatus::Cancelled);
        assert_eq!(second.notes, first.notes);
        assert_eq!(second.cu_used, first.cu_used);
        assert_eq!(second.duration_minutes, first.duration_minutes);
    }

    #[tokio::test]
    async fn test_cancel_rejected_after_completion() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 30,
                scheduled_start_time: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .unwrap();
        service.complete(record.id, 30, None, None).await.unwrap();

        let result = service.cancel(record.id, None).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_update_duration_recomputes_cu() {
        let p = project();
        let e = expert();
        let service = service_with(vec![p.clone()], vec![e.clone()]);

        let record = service
            .create(CreateCallInput {
                project_id: p.id,
                expert_id: e.id,
                duration_minutes: 30,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(record.cu_used, dec!(0.5));

        let updated = service
            .update(
                record.id,
                UpdateCallInput {
                    duration_minutes: Some(61),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.cu_used, dec!(1.25));
        // Status untouched by generic update
        assert_eq!(updated.status, CallStatus::Pending);
    }

    #[tokio::test]
    async fn test_operations_on_unknown_id_are_not_found() {
        let service = service_with(vec![], vec![]);
        let id = Uuid::new_v4();

        assert!(matches!(
            service.get(id).await,
            Err(AppError::CallRecordNotFound(_))
        ));
        assert!(matches!(
            service.complete(id, 30, None, None).await,
            Err(AppError::CallRecordNotFound(_))
        ));
        assert!(matches!(
            service.cancel(id, None).await,
            Err(AppError::CallRecordNotFound(_))
        ));
        assert!(matches!(
            service.remove(id).await,
            Err(AppError::CallRecordNotFound(_))
        ));
    }
}
