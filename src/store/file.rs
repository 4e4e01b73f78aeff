use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::record::JobRecord;
use crate::gateway::{JobStore, StoreError};
use crate::payment::generate_completion_code;
use crate::workflow::{
    CustomerDecision, InspectionSubmission, Job, JobStatus, JobWorkflowEngine, QuoteSubmission,
    StatusUpdateRequest,
};

/// On-disk layout of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    jobs: Vec<JobRecord>,
    /// booking id -> code the customer was given
    #[serde(default)]
    completion_codes: BTreeMap<String, String>,
    /// booking id -> wrong codes entered against the current code
    #[serde(default)]
    code_attempts: BTreeMap<String, u32>,
}

impl StoreDocument {
    fn record_mut(&mut self, booking_id: &str) -> Result<&mut JobRecord, StoreError> {
        self.jobs
            .iter_mut()
            .find(|r| r.id == booking_id)
            .ok_or_else(|| StoreError::NotFound(booking_id.to_string()))
    }

    fn record(&self, booking_id: &str) -> Result<&JobRecord, StoreError> {
        self.jobs
            .iter()
            .find(|r| r.id == booking_id)
            .ok_or_else(|| StoreError::NotFound(booking_id.to_string()))
    }
}

/// Job store backed by a single JSON document.
///
/// Every write re-reads the file, applies the change, checks that the touched
/// row still converts into a valid [`Job`], and replaces the file atomically.
/// A failed write leaves the file untouched.
#[derive(Debug)]
pub struct JsonFileJobStore {
    path: PathBuf,
    code_length: usize,
    lock: Mutex<()>,
}

impl JsonFileJobStore {
    pub fn new(path: impl Into<PathBuf>, code_length: usize) -> Self {
        Self {
            path: path.into(),
            code_length,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoreDocument, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(StoreDocument::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(document)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn modify<R>(
        &self,
        booking_id: &str,
        change: impl FnOnce(&mut StoreDocument) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        let result = change(&mut document)?;
        document.record(booking_id)?.to_job()?;
        self.write(&document).await?;
        Ok(result)
    }

    /// Add a job created by the dispatch service.
    pub async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        if document.jobs.iter().any(|r| r.id == job.id) {
            return Err(StoreError::Rejected(format!("job {} already exists", job.id)));
        }
        document.jobs.push(JobRecord::from(job));
        self.write(&document).await?;
        info!(booking_id = %job.id, technician_id = %job.technician_id, "Job stored");
        Ok(())
    }

    /// Record the customer's answer to a shared quote, as the customer app would.
    pub async fn record_customer_decision(
        &self,
        engine: &JobWorkflowEngine,
        booking_id: &str,
        decision: CustomerDecision,
    ) -> Result<Job, StoreError> {
        self.modify(booking_id, |document| {
            let record = document.record_mut(booking_id)?;
            let job = record.to_job()?;
            let stage = engine
                .observe_customer_decision(&job, decision)
                .map_err(|e| StoreError::Rejected(e.to_string()))?;
            let note = match decision {
                CustomerDecision::Approve => "Customer approved the quotation",
                CustomerDecision::Reject => "Customer rejected the quotation",
            };
            let request = StatusUpdateRequest::new(&job.id, &job.order_id, stage.status(), note);
            record.apply_status_update(&request, Utc::now())?;
            Ok(job.with_stage(stage))
        })
        .await
    }
}

#[async_trait]
impl JobStore for JsonFileJobStore {
    async fn fetch_job(&self, booking_id: &str) -> Result<Job, StoreError> {
        let document = self.read().await?;
        document.record(booking_id)?.to_job()
    }

    async fn list_jobs(&self, technician_id: &str) -> Result<Vec<Job>, StoreError> {
        let document = self.read().await?;
        let mut jobs = document
            .jobs
            .iter()
            .filter(|r| r.technician_id == technician_id)
            .map(JobRecord::to_job)
            .collect::<Result<Vec<_>, _>>()?;
        jobs.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(jobs)
    }

    async fn update_status(&self, request: &StatusUpdateRequest) -> Result<(), StoreError> {
        let code_length = self.code_length;
        self.modify(&request.booking_id, |document| {
            document
                .record_mut(&request.booking_id)?
                .apply_status_update(request, Utc::now())?;
            if request.status == JobStatus::CodeSent {
                let code = generate_completion_code(code_length);
                document
                    .completion_codes
                    .insert(request.booking_id.clone(), code);
                document.code_attempts.remove(&request.booking_id);
            }
            Ok(())
        })
        .await?;
        debug!(booking_id = %request.booking_id, status = %request.status, "Status stored");
        Ok(())
    }

    async fn save_inspection(&self, submission: &InspectionSubmission) -> Result<(), StoreError> {
        self.modify(&submission.booking_id, |document| {
            let record = document.record_mut(&submission.booking_id)?;
            if record.technician_id != submission.technician_id {
                return Err(StoreError::Rejected(format!(
                    "job {} is not assigned to {}",
                    record.id, submission.technician_id
                )));
            }
            record.apply_inspection(submission)
        })
        .await
    }

    async fn share_quote(&self, submission: &QuoteSubmission) -> Result<(), StoreError> {
        self.modify(&submission.booking_id, |document| {
            document
                .record_mut(&submission.booking_id)?
                .apply_quote(submission)
        })
        .await
    }

    async fn completion_code(&self, booking_id: &str) -> Result<Option<String>, StoreError> {
        let document = self.read().await?;
        document.record(booking_id)?;
        Ok(document.completion_codes.get(booking_id).cloned())
    }

    async fn failed_code_attempts(&self, booking_id: &str) -> Result<u32, StoreError> {
        let document = self.read().await?;
        document.record(booking_id)?;
        Ok(document.code_attempts.get(booking_id).copied().unwrap_or(0))
    }

    async fn record_failed_code_attempt(&self, booking_id: &str) -> Result<u32, StoreError> {
        let attempts = self
            .modify(booking_id, |document| {
                let attempts = document
                    .code_attempts
                    .entry(booking_id.to_string())
                    .or_insert(0);
                *attempts = attempts.saturating_add(1);
                Ok(*attempts)
            })
            .await?;
        debug!(booking_id = %booking_id, attempts, "Wrong completion code counted");
        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::job::fixtures::assigned_job;
    use rust_decimal::Decimal;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileJobStore {
        JsonFileJobStore::new(dir.path().join("data").join("jobs.json"), 4)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.list_jobs("tech-9").await.unwrap().is_empty());
        assert!(matches!(
            store.fetch_job("BK-1").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let job = assigned_job();
        store.insert(&job).await.unwrap();

        assert_eq!(store.fetch_job("BK-1001").await.unwrap(), job);
        assert_eq!(store.list_jobs("tech-9").await.unwrap().len(), 1);
        assert!(store.list_jobs("tech-1").await.unwrap().is_empty());
        assert!(store.insert(&job).await.is_err());
    }

    #[tokio::test]
    async fn test_code_issued_when_code_sent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.insert(&assigned_job()).await.unwrap();
        assert_eq!(store.completion_code("BK-1001").await.unwrap(), None);

        // Walk the row to repair_started directly through the store.
        for (status, note) in [
            (JobStatus::Accepted, "accepted"),
            (JobStatus::OnTheWay, "on the way"),
            (JobStatus::InspectionStarted, "inspecting"),
        ] {
            store
                .update_status(&StatusUpdateRequest::new("BK-1001", "ORD-77", status, note))
                .await
                .unwrap();
        }
        store
            .save_inspection(&InspectionSubmission {
                booking_id: "BK-1001".into(),
                technician_id: "tech-9".into(),
                inspection_fee: Decimal::from(300),
                findings: vec!["Screen cracked".into()],
                notes: None,
                issue_image_url: None,
            })
            .await
            .unwrap();
        store
            .share_quote(&QuoteSubmission {
                booking_id: "BK-1001".into(),
                labor_cost: Decimal::from(500),
                parts_cost: Decimal::from(1200),
                total_amount: Decimal::from(1700),
                notes: None,
            })
            .await
            .unwrap();
        for status in [
            JobStatus::InspectionCompleted,
            JobStatus::QuotationShared,
            JobStatus::QuotationApproved,
            JobStatus::RepairStarted,
        ] {
            store
                .update_status(&StatusUpdateRequest::new("BK-1001", "ORD-77", status, "step"))
                .await
                .unwrap();
        }

        let mut request = StatusUpdateRequest::new("BK-1001", "ORD-77", JobStatus::CodeSent, "done");
        request.final_cost = Some(Decimal::from(1700));
        store.update_status(&request).await.unwrap();

        let code = store.completion_code("BK-1001").await.unwrap().unwrap();
        assert_eq!(code.len(), 4);
        assert_eq!(store.failed_code_attempts("BK-1001").await.unwrap(), 0);
        assert_eq!(store.record_failed_code_attempt("BK-1001").await.unwrap(), 1);
        assert_eq!(store.record_failed_code_attempt("BK-1001").await.unwrap(), 2);

        // A second store over the same file sees the same count.
        let reopened = store_in(&dir);
        assert_eq!(reopened.failed_code_attempts("BK-1001").await.unwrap(), 2);
        assert_eq!(
            store.fetch_job("BK-1001").await.unwrap().status(),
            JobStatus::CodeSent
        );
    }

    #[tokio::test]
    async fn test_inconsistent_write_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.insert(&assigned_job()).await.unwrap();

        // inspection_completed without an inspection on file cannot be read back
        let err = store
            .update_status(&StatusUpdateRequest::new(
                "BK-1001",
                "ORD-77",
                JobStatus::InspectionCompleted,
                "skipped ahead",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
        assert_eq!(
            store.fetch_job("BK-1001").await.unwrap().status(),
            JobStatus::Assigned
        );
    }

    #[tokio::test]
    async fn test_inspection_for_other_technician_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.insert(&assigned_job()).await.unwrap();
        for status in [
            JobStatus::Accepted,
            JobStatus::OnTheWay,
            JobStatus::InspectionStarted,
        ] {
            store
                .update_status(&StatusUpdateRequest::new("BK-1001", "ORD-77", status, "step"))
                .await
                .unwrap();
        }

        let err = store
            .save_inspection(&InspectionSubmission {
                booking_id: "BK-1001".into(),
                technician_id: "tech-1".into(),
                inspection_fee: Decimal::from(300),
                findings: vec!["Screen cracked".into()],
                notes: None,
                issue_image_url: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "job BK-1001 is not assigned to tech-1");
    }

    #[tokio::test]
    async fn test_customer_decision_requires_shared_quote() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.insert(&assigned_job()).await.unwrap();
        let err = store
            .record_customer_decision(
                &JobWorkflowEngine::default(),
                "BK-1001",
                CustomerDecision::Approve,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }
}
