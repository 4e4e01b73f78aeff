// Drives a job session against the real collaborators: checks who is acting,
// asks the engine, then writes the result to the job store.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn, Instrument};

use crate::gateway::{
    AuthError, AuthProvider, JobStore, NotifierError, NotifierGateway, Role, Session, StoreError,
};
use crate::metrics::{DispatchMetrics, OperationTimer};
use crate::session::{JobSession, SessionEvent, SessionMachine};
use crate::telemetry::{create_transition_span, generate_correlation_id};
use crate::workflow::{
    AuxiliaryRequest, Job, JobAction, JobStatus, JobWorkflowEngine, SideEffectRequest,
    TransitionDecision, TransitionError, ValidationError,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{user_id} is signed in as {role}; only technicians can update jobs")]
    NotTechnician { user_id: String, role: Role },
    #[error("job {booking_id} is not assigned to {user_id}")]
    NotAssigned { booking_id: String, user_id: String },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    /// The store's own message, unchanged.
    #[error("{0}")]
    ExternalFailure(#[from] StoreError),
    #[error("no completion code has been issued for job {0}")]
    CodeNotIssued(String),
    #[error(transparent)]
    Notification(#[from] NotifierError),
}

pub struct JobDispatcher<S, N, A> {
    engine: JobWorkflowEngine,
    store: S,
    notifier: N,
    auth: A,
    metrics: Arc<DispatchMetrics>,
}

impl<S, N, A> JobDispatcher<S, N, A>
where
    S: JobStore,
    N: NotifierGateway,
    A: AuthProvider,
{
    pub fn new(engine: JobWorkflowEngine, store: S, notifier: N, auth: A) -> Self {
        Self {
            engine,
            store,
            notifier,
            auth,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn engine(&self) -> &JobWorkflowEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Jobs assigned to the signed-in technician, newest first.
    pub async fn my_jobs(&self) -> Result<Vec<Job>, DispatchError> {
        let user = self.require_technician().await?;
        Ok(self.store.list_jobs(&user.user_id).await?)
    }

    pub async fn open_session(&self, booking_id: &str) -> Result<SessionMachine, DispatchError> {
        let job = self.store.fetch_job(booking_id).await?;
        let mut session = JobSession::start(self.engine.clone(), job);
        self.load_code_attempts(&mut session).await?;
        Ok(session)
    }

    /// Run one technician action end to end.
    ///
    /// A rejected action sends nothing. An accepted one sends its auxiliary
    /// payload (if any) and then exactly one status update; if the store
    /// refuses either, the session keeps the requested stage and is marked
    /// as failed delivery until the next [`refresh`](Self::refresh).
    ///
    /// When the auxiliary payload lands but the status update does not, the
    /// store keeps the inspection or quote. Performing the action again with
    /// corrected values replaces it, since the status has not moved on.
    pub async fn perform(
        &self,
        session: &mut SessionMachine,
        action: JobAction,
    ) -> Result<TransitionDecision, DispatchError> {
        let user = self.authorize(session.inner().job()).await?;
        let booking_id = session.inner().job().id.clone();
        let correlation_id = generate_correlation_id();
        let span = create_transition_span(
            action.kind().as_str(),
            &booking_id,
            Some(&user.user_id),
            &correlation_id,
        );

        async {
            let timer = OperationTimer::new(action.kind().as_str());
            self.metrics.record_attempt();

            let previous = session.inner().job().status();
            session.handle(&SessionEvent::Act(action.clone()));
            let decision = match session.inner().last_outcome() {
                Some(Ok(decision)) if decision.previous == previous => decision.clone(),
                Some(Err(e)) => {
                    let e = e.clone();
                    self.metrics.record_rejected();
                    info!(status = %previous, error = %e, "Action rejected");
                    if let TransitionError::Validation(
                        reason @ (ValidationError::CompletionCodeMismatch
                        | ValidationError::MalformedCompletionCode { .. }),
                    ) = &e
                    {
                        if matches!(reason, ValidationError::CompletionCodeMismatch) {
                            self.metrics.record_code_mismatch();
                        }
                        let attempts = self.store.record_failed_code_attempt(&booking_id).await?;
                        session.handle(&SessionEvent::CodeAttemptsOnFile(attempts));
                    }
                    return Err(DispatchError::Rejected(e));
                }
                _ => {
                    self.metrics.record_rejected();
                    return Err(DispatchError::Rejected(TransitionError::InvalidTransition {
                        status: previous,
                        action: action.kind(),
                    }));
                }
            };

            if let Err(e) = self.deliver(&decision.request).await {
                session.handle(&SessionEvent::DeliveryFailed {
                    error: e.to_string(),
                });
                self.metrics.record_delivery_failure();
                return Err(DispatchError::ExternalFailure(e));
            }
            session.handle(&SessionEvent::Delivered);
            self.metrics.record_delivered();

            if decision.next_status() == JobStatus::CodeSent {
                self.notify_code(session.inner().job()).await;
            }

            timer.finish();
            Ok(decision)
        }
        .instrument(span)
        .await
    }

    /// Check the customer's code against the one on file and, when it matches,
    /// move the job on to payment.
    pub async fn verify_completion_code(
        &self,
        session: &mut SessionMachine,
        submitted: &str,
    ) -> Result<TransitionDecision, DispatchError> {
        self.authorize(session.inner().job()).await?;
        let booking_id = session.inner().job().id.clone();
        let on_file = self
            .store
            .completion_code(&booking_id)
            .await?
            .ok_or(DispatchError::CodeNotIssued(booking_id))?;

        self.perform(
            session,
            JobAction::VerifyCompletionCode {
                submitted: submitted.to_string(),
                on_file,
            },
        )
        .await
    }

    /// Replace the session's view of the job with what the store holds now.
    pub async fn refresh(&self, session: &mut SessionMachine) -> Result<(), DispatchError> {
        let booking_id = session.inner().job().id.clone();
        let job = self.store.fetch_job(&booking_id).await?;
        session.handle(&SessionEvent::Reconcile(job));
        self.load_code_attempts(session).await
    }

    pub async fn resend_completion_code(
        &self,
        session: &SessionMachine,
    ) -> Result<(), DispatchError> {
        let job = session.inner().job();
        self.authorize(job).await?;
        if job.status() != JobStatus::CodeSent {
            return Err(DispatchError::CodeNotIssued(job.id.clone()));
        }
        self.notifier
            .send_completion_code(&job.id, &job.customer)
            .await?;
        info!(booking_id = %job.id, "Completion code resent");
        Ok(())
    }

    async fn require_technician(&self) -> Result<Session, DispatchError> {
        let user = self.auth.current_session().await?;
        if !user.is_technician() {
            warn!(user_id = %user.user_id, role = %user.role, "Non-technician tried to act on a job");
            return Err(DispatchError::NotTechnician {
                user_id: user.user_id,
                role: user.role,
            });
        }
        Ok(user)
    }

    /// A technician acting on a job assigned to them.
    async fn authorize(&self, job: &Job) -> Result<Session, DispatchError> {
        let user = self.require_technician().await?;
        if job.technician_id != user.user_id {
            warn!(
                booking_id = %job.id,
                user_id = %user.user_id,
                assigned_to = %job.technician_id,
                "Technician tried to act on someone else's job"
            );
            return Err(DispatchError::NotAssigned {
                booking_id: job.id.clone(),
                user_id: user.user_id,
            });
        }
        Ok(user)
    }

    async fn load_code_attempts(&self, session: &mut SessionMachine) -> Result<(), DispatchError> {
        let job = session.inner().job();
        if job.status() != JobStatus::CodeSent {
            return Ok(());
        }
        let attempts = self.store.failed_code_attempts(&job.id).await?;
        session.handle(&SessionEvent::CodeAttemptsOnFile(attempts));
        Ok(())
    }

    async fn deliver(&self, request: &SideEffectRequest) -> Result<(), StoreError> {
        match &request.auxiliary {
            Some(AuxiliaryRequest::Inspection(submission)) => {
                self.store.save_inspection(submission).await?
            }
            Some(AuxiliaryRequest::Quote(submission)) => self.store.share_quote(submission).await?,
            None => {}
        }
        self.store.update_status(&request.status_update).await
    }

    async fn notify_code(&self, job: &Job) {
        if let Err(e) = self.notifier.send_completion_code(&job.id, &job.customer).await {
            self.metrics.record_notification_failure();
            warn!(booking_id = %job.id, error = %e, "Completion code not delivered; resend it from the job screen");
        }
    }
}
