//! In-memory repository fakes shared by the service tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::{
    models::{CallRecord, CallStatus, Expert, Project},
    traits::{CallRecordRepository, ExpertRepository, ProjectRepository, Repository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MockCallRepo {
    records: Mutex<HashMap<Uuid, CallRecord>>,
}

impl MockCallRepo {
    pub fn with(records: Vec<CallRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }
}

#[async_trait]
impl Repository<CallRecord, Uuid> for MockCallRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CallRecord>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<CallRecord>> {
        let mut all: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|r| r.created_at);
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.records.lock().unwrap().len() as i64)
    }

    async fn create(&self, entity: &CallRecord) -> AppResult<CallRecord> {
        self.records
            .lock()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &CallRecord) -> AppResult<CallRecord> {
        let mut records = self.records.lock().unwrap();
        if !records.contains_key(&entity.id) {
            return Err(AppError::CallRecordNotFound(entity.id.to_string()));
        }
        records.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.records.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl CallRecordRepository for MockCallRepo {
    async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<CallRecord>> {
        let mut calls: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                r.is_billable()
                    && r.completed_at
                        .map(|at| at >= start && at < end)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        calls.sort_by_key(|r| r.completed_at);
        Ok(calls)
    }

    async fn list_filtered(
        &self,
        project_id: Option<Uuid>,
        expert_id: Option<Uuid>,
        status: Option<CallStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<CallRecord>, i64)> {
        let mut calls: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                project_id.map(|p| r.project_id == p).unwrap_or(true)
                    && expert_id.map(|e| r.expert_id == e).unwrap_or(true)
                    && status.map(|s| r.status == s).unwrap_or(true)
            })
            .cloned()
            .collect();
        calls.sort_by_key(|r| r.created_at);
        let total = calls.len() as i64;
        let page = calls
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
pub struct MockProjectRepo {
    projects: Mutex<HashMap<Uuid, Project>>,
}

impl MockProjectRepo {
    pub fn with(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub fn total_cu(&self, id: Uuid) -> Decimal {
        self.projects
            .lock()
            .unwrap()
            .get(&id)
            .map(|p| p.total_cu_used)
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl Repository<Project, Uuid> for MockProjectRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        Ok(self.projects.lock().unwrap().get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Project>> {
        let all: Vec<_> = self.projects.lock().unwrap().values().cloned().collect();
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.projects.lock().unwrap().len() as i64)
    }

    async fn create(&self, entity: &Project) -> AppResult<Project> {
        self.projects
            .lock()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &Project) -> AppResult<Project> {
        self.projects
            .lock()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.projects.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl ProjectRepository for MockProjectRepo {
    async fn increment_total_cu(&self, id: Uuid, delta: Decimal) -> AppResult<Decimal> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&id)
            .ok_or_else(|| AppError::ProjectNotFound(id.to_string()))?;
        project.total_cu_used += delta;
        Ok(project.total_cu_used)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Project>> {
        let projects = self.projects.lock().unwrap();
        Ok(ids.iter().filter_map(|id| projects.get(id).cloned()).collect())
    }
}

#[derive(Default)]
pub struct MockExpertRepo {
    experts: Mutex<HashMap<Uuid, Expert>>,
}

impl MockExpertRepo {
    pub fn with(experts: Vec<Expert>) -> Self {
        Self {
            experts: Mutex::new(experts.into_iter().map(|e| (e.id, e)).collect()),
        }
    }
}

#[async_trait]
impl Repository<Expert, Uuid> for MockExpertRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Expert>> {
        Ok(self.experts.lock().unwrap().get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Expert>> {
        let all: Vec<_> = self.experts.lock().unwrap().values().cloned().collect();
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.experts.lock().unwrap().len() as i64)
    }

    async fn create(&self, entity: &Expert) -> AppResult<Expert> {
        self.experts
            .lock()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &Expert) -> AppResult<Expert> {
        self.experts
            .lock()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.experts.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl ExpertRepository for MockExpertRepo {
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Expert>> {
        let experts = self.experts.lock().unwrap();
        Ok(ids.iter().filter_map(|id| experts.get(id).cloned()).collect())
    }

    async fn list_sourced_by(&self, ra_id: Uuid) -> AppResult<Vec<Expert>> {
        Ok(self
            .experts
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.sourced_by_ra_id == Some(ra_id))
            .cloned()
            .collect())
    }
}
