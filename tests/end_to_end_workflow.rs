//! Integration tests for a full repair job, driven through the dispatcher
//! against the JSON file store.

use async_trait::async_trait;
use fieldfix::gateway::{JobStore, LogNotifier, Role, Session, StaticAuthProvider, StoreError};
use fieldfix::workflow::{
    Customer, CustomerDecision, InspectionSubmission, Job, JobAction, JobStatus,
    JobWorkflowEngine, QuoteSubmission, StatusUpdateRequest,
};
use fieldfix::config::WorkflowConfig;
use fieldfix::{DispatchError, JobDispatcher, JsonFileJobStore, PaymentMethod, ValidationError};
use rust_decimal::Decimal;
use std::sync::Arc;

/// File store whose completion codes are always `code`, so the scenario can
/// use a known value.
struct KnownCodeStore {
    inner: Arc<JsonFileJobStore>,
    code: String,
}

#[async_trait]
impl JobStore for KnownCodeStore {
    async fn fetch_job(&self, booking_id: &str) -> Result<Job, StoreError> {
        self.inner.fetch_job(booking_id).await
    }

    async fn list_jobs(&self, technician_id: &str) -> Result<Vec<Job>, StoreError> {
        self.inner.list_jobs(technician_id).await
    }

    async fn update_status(&self, request: &StatusUpdateRequest) -> Result<(), StoreError> {
        self.inner.update_status(request).await
    }

    async fn save_inspection(&self, submission: &InspectionSubmission) -> Result<(), StoreError> {
        self.inner.save_inspection(submission).await
    }

    async fn share_quote(&self, submission: &QuoteSubmission) -> Result<(), StoreError> {
        self.inner.share_quote(submission).await
    }

    async fn completion_code(&self, booking_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .inner
            .completion_code(booking_id)
            .await?
            .map(|_| self.code.clone()))
    }

    async fn failed_code_attempts(&self, booking_id: &str) -> Result<u32, StoreError> {
        self.inner.failed_code_attempts(booking_id).await
    }

    async fn record_failed_code_attempt(&self, booking_id: &str) -> Result<u32, StoreError> {
        self.inner.record_failed_code_attempt(booking_id).await
    }
}

fn technician() -> StaticAuthProvider {
    StaticAuthProvider::new(Session {
        user_id: "tech-9".to_string(),
        role: Role::Technician,
    })
}

fn new_job() -> Job {
    Job::assigned(
        "BK-1001",
        "ORD-77",
        "tech-9",
        Customer {
            name: "Asha Rao".to_string(),
            phone: "+919800000000".to_string(),
            address: "12 MG Road, Bengaluru".to_string(),
        },
        "mobile",
        "Phone screen shattered",
    )
}

async fn seeded_store(dir: &tempfile::TempDir) -> Arc<JsonFileJobStore> {
    let store = Arc::new(JsonFileJobStore::new(dir.path().join("jobs.json"), 4));
    store.insert(&new_job()).await.unwrap();
    store
}

#[tokio::test]
async fn test_full_repair_job_reaches_repair_completed() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = seeded_store(&dir).await;
    let engine = JobWorkflowEngine::default();
    let dispatcher = JobDispatcher::new(
        engine.clone(),
        KnownCodeStore {
            inner: Arc::clone(&file_store),
            code: "4321".to_string(),
        },
        LogNotifier,
        technician(),
    );

    let mut session = dispatcher.open_session("BK-1001").await.unwrap();
    assert_eq!(session.inner().job().status(), JobStatus::Assigned);

    let steps = [
        (JobAction::Accept, JobStatus::Accepted),
        (JobAction::StartTravel, JobStatus::OnTheWay),
        (JobAction::StartInspection, JobStatus::InspectionStarted),
        (
            JobAction::SubmitInspection {
                findings: vec!["Screen cracked".to_string()],
                fee: Decimal::from(300),
                notes: None,
                photo_url: None,
            },
            JobStatus::InspectionCompleted,
        ),
        (
            JobAction::ShareQuote {
                labor_cost: Decimal::from(500),
                parts_cost: Decimal::from(1200),
                notes: None,
            },
            JobStatus::QuotationShared,
        ),
    ];
    for (action, expected) in steps {
        let decision = dispatcher.perform(&mut session, action).await.unwrap();
        assert_eq!(decision.next_status(), expected);
    }

    let shared = file_store.fetch_job("BK-1001").await.unwrap();
    assert_eq!(
        shared.stage.quote().unwrap().total_amount(),
        Decimal::from(1700)
    );

    // The customer approves from their own app.
    file_store
        .record_customer_decision(&engine, "BK-1001", CustomerDecision::Approve)
        .await
        .unwrap();
    dispatcher.refresh(&mut session).await.unwrap();
    assert_eq!(
        session.inner().job().status(),
        JobStatus::QuotationApproved
    );

    dispatcher
        .perform(&mut session, JobAction::StartRepair)
        .await
        .unwrap();
    let decision = dispatcher
        .perform(
            &mut session,
            JobAction::SubmitRepair {
                final_cost: Decimal::from(1700),
                spare_parts_used: Some("Display panel".to_string()),
                technician_notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(decision.next_status(), JobStatus::CodeSent);

    let decision = dispatcher
        .verify_completion_code(&mut session, "4321")
        .await
        .unwrap();
    assert_eq!(decision.next_status(), JobStatus::PaymentPending);

    let decision = dispatcher
        .perform(
            &mut session,
            JobAction::CollectPayment {
                amount: Decimal::from(1700),
                method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();
    assert_eq!(decision.next_status(), JobStatus::RepairCompleted);

    let stored = file_store.fetch_job("BK-1001").await.unwrap();
    assert_eq!(stored.status(), JobStatus::RepairCompleted);
    assert_eq!(stored.stage.final_cost(), Some(Decimal::from(1700)));
    assert_eq!(
        engine.payout(Decimal::from(1700)).unwrap(),
        Decimal::from(1394)
    );

    let stats = dispatcher.metrics().get_stats();
    assert_eq!(stats.transitions_delivered, 9);
    assert_eq!(stats.transitions_rejected, 0);
}

#[tokio::test]
async fn test_wrong_code_keeps_job_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = seeded_store(&dir).await;
    let dispatcher = JobDispatcher::new(
        JobWorkflowEngine::default(),
        Arc::clone(&file_store),
        LogNotifier,
        technician(),
    );
    let mut session = dispatcher.open_session("BK-1001").await.unwrap();

    for action in [
        JobAction::Accept,
        JobAction::StartTravel,
        JobAction::StartInspection,
        JobAction::SubmitInspection {
            findings: vec!["Screen cracked".to_string()],
            fee: Decimal::from(300),
            notes: None,
            photo_url: None,
        },
        JobAction::ShareQuote {
            labor_cost: Decimal::from(500),
            parts_cost: Decimal::from(1200),
            notes: None,
        },
    ] {
        dispatcher.perform(&mut session, action).await.unwrap();
    }
    file_store
        .record_customer_decision(dispatcher.engine(), "BK-1001", CustomerDecision::Approve)
        .await
        .unwrap();
    dispatcher.refresh(&mut session).await.unwrap();
    dispatcher
        .perform(&mut session, JobAction::StartRepair)
        .await
        .unwrap();
    dispatcher
        .perform(
            &mut session,
            JobAction::SubmitRepair {
                final_cost: Decimal::from(1700),
                spare_parts_used: None,
                technician_notes: None,
            },
        )
        .await
        .unwrap();

    let issued = file_store.completion_code("BK-1001").await.unwrap().unwrap();
    let wrong = if issued == "0000" { "1111" } else { "0000" };

    let err = dispatcher
        .verify_completion_code(&mut session, wrong)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Rejected(fieldfix::TransitionError::Validation(
            ValidationError::CompletionCodeMismatch
        ))
    ));
    assert_eq!(
        file_store.fetch_job("BK-1001").await.unwrap().status(),
        JobStatus::CodeSent
    );

    dispatcher
        .verify_completion_code(&mut session, &issued)
        .await
        .unwrap();
    assert_eq!(
        file_store.fetch_job("BK-1001").await.unwrap().status(),
        JobStatus::PaymentPending
    );
}

/// Drive a freshly seeded job to `code_sent` with the given dispatcher.
async fn repair_to_code_sent<S, N, A>(
    dispatcher: &JobDispatcher<S, N, A>,
    file_store: &JsonFileJobStore,
) where
    S: JobStore,
    N: fieldfix::gateway::NotifierGateway,
    A: fieldfix::gateway::AuthProvider,
{
    let mut session = dispatcher.open_session("BK-1001").await.unwrap();
    for action in [
        JobAction::Accept,
        JobAction::StartTravel,
        JobAction::StartInspection,
        JobAction::SubmitInspection {
            findings: vec!["Screen cracked".to_string()],
            fee: Decimal::from(300),
            notes: None,
            photo_url: None,
        },
        JobAction::ShareQuote {
            labor_cost: Decimal::from(500),
            parts_cost: Decimal::from(1200),
            notes: None,
        },
    ] {
        dispatcher.perform(&mut session, action).await.unwrap();
    }
    file_store
        .record_customer_decision(dispatcher.engine(), "BK-1001", CustomerDecision::Approve)
        .await
        .unwrap();
    dispatcher.refresh(&mut session).await.unwrap();
    dispatcher
        .perform(&mut session, JobAction::StartRepair)
        .await
        .unwrap();
    dispatcher
        .perform(
            &mut session,
            JobAction::SubmitRepair {
                final_cost: Decimal::from(1700),
                spare_parts_used: None,
                technician_notes: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_code_attempt_limit_survives_new_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = seeded_store(&dir).await;
    let engine = JobWorkflowEngine::new(WorkflowConfig {
        max_code_attempts: Some(1),
        ..WorkflowConfig::default()
    });
    let dispatcher = JobDispatcher::new(
        engine,
        KnownCodeStore {
            inner: Arc::clone(&file_store),
            code: "4321".to_string(),
        },
        LogNotifier,
        technician(),
    );
    repair_to_code_sent(&dispatcher, &file_store).await;

    let mut first = dispatcher.open_session("BK-1001").await.unwrap();
    let err = dispatcher
        .verify_completion_code(&mut first, "1111")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Rejected(fieldfix::TransitionError::Validation(
            ValidationError::CompletionCodeMismatch
        ))
    ));

    // A new session picks the count up from the store.
    let mut second = dispatcher.open_session("BK-1001").await.unwrap();
    assert_eq!(second.inner().failed_code_attempts(), 1);
    let err = dispatcher
        .verify_completion_code(&mut second, "4321")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Rejected(fieldfix::TransitionError::Validation(
            ValidationError::TooManyCodeAttempts { attempts: 1 }
        ))
    ));
    assert_eq!(
        file_store.fetch_job("BK-1001").await.unwrap().status(),
        JobStatus::CodeSent
    );
}

#[tokio::test]
async fn test_job_of_another_technician_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = seeded_store(&dir).await;
    let dispatcher = JobDispatcher::new(
        JobWorkflowEngine::default(),
        Arc::clone(&file_store),
        LogNotifier,
        StaticAuthProvider::new(Session {
            user_id: "tech-1".to_string(),
            role: Role::Technician,
        }),
    );

    let mut session = dispatcher.open_session("BK-1001").await.unwrap();
    let err = dispatcher
        .perform(&mut session, JobAction::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::NotAssigned { .. }));
    assert_eq!(
        file_store.fetch_job("BK-1001").await.unwrap().status(),
        JobStatus::Assigned
    );
}

#[tokio::test]
async fn test_direct_payment_after_inspection() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = seeded_store(&dir).await;
    let dispatcher = JobDispatcher::new(
        JobWorkflowEngine::default(),
        Arc::clone(&file_store),
        LogNotifier,
        technician(),
    );
    let mut session = dispatcher.open_session("BK-1001").await.unwrap();

    for action in [
        JobAction::Accept,
        JobAction::StartTravel,
        JobAction::StartInspection,
        JobAction::SubmitInspection {
            findings: vec!["Loose connector, reseated".to_string()],
            fee: Decimal::from(300),
            notes: None,
            photo_url: None,
        },
        JobAction::CollectDirectPayment {
            amount: Decimal::from(300),
            method: PaymentMethod::Upi {
                transaction_ref: Some("UTR998877".to_string()),
            },
        },
    ] {
        dispatcher.perform(&mut session, action).await.unwrap();
    }

    let stored = file_store.fetch_job("BK-1001").await.unwrap();
    assert_eq!(stored.status(), JobStatus::RepairCompleted);
    assert_eq!(stored.stage.final_cost(), Some(Decimal::from(300)));
    assert!(stored.stage.quote().is_none());

    let jobs = dispatcher.my_jobs().await.unwrap();
    let summary =
        fieldfix::EarningsSummary::from_jobs(&jobs, Decimal::from(18), None).unwrap();
    assert_eq!(summary.completed_jobs, 1);
    assert_eq!(summary.payout, Decimal::from(246));
}
