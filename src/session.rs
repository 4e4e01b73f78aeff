// One technician's live view of one job.
//
// The engine only decides; the session remembers what was decided, whether
// the store has confirmed it, and how many completion-code guesses have been
// made. A failed delivery does not roll the session back: the requested stage
// stays until a `Reconcile` with the re-read job replaces it.

use statig::prelude::*;
use tracing::{info, warn};

use crate::workflow::{
    ActionKind, Job, JobAction, JobStatus, JobWorkflowEngine, SideEffectRequest,
    TransitionDecision, TransitionError, ValidationError,
};

pub type SessionMachine = statig::blocking::StateMachine<JobSession>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Act(JobAction),
    /// The store accepted the last request.
    Delivered,
    DeliveryFailed { error: String },
    /// Fresh copy of the job from the store.
    Reconcile(Job),
    /// Failed completion-code attempts the store has counted for this job.
    CodeAttemptsOnFile(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing requested since the job was last read.
    Idle,
    Pending,
    Confirmed,
    Failed(String),
}

pub struct JobSession {
    engine: JobWorkflowEngine,
    job: Job,
    last_outcome: Option<Result<TransitionDecision, TransitionError>>,
    delivery: Delivery,
    failed_code_attempts: u32,
}

impl JobSession {
    pub fn new(engine: JobWorkflowEngine, job: Job) -> Self {
        Self {
            engine,
            job,
            last_outcome: None,
            delivery: Delivery::Idle,
            failed_code_attempts: 0,
        }
    }

    /// Build the machine and bring it in line with `job`'s current status.
    pub fn start(engine: JobWorkflowEngine, job: Job) -> SessionMachine {
        let mut machine = Self::new(engine, job.clone()).state_machine();
        machine.handle(&SessionEvent::Reconcile(job));
        machine
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn engine(&self) -> &JobWorkflowEngine {
        &self.engine
    }

    pub fn last_outcome(&self) -> Option<&Result<TransitionDecision, TransitionError>> {
        self.last_outcome.as_ref()
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    pub fn failed_code_attempts(&self) -> u32 {
        self.failed_code_attempts
    }

    /// The request still waiting on the store, if any.
    pub fn pending_request(&self) -> Option<&SideEffectRequest> {
        match (&self.delivery, &self.last_outcome) {
            (Delivery::Pending, Some(Ok(decision))) => Some(&decision.request),
            _ => None,
        }
    }

    fn phase_for(status: JobStatus) -> State {
        if status.is_terminal() {
            State::finished()
        } else if status == JobStatus::CodeSent {
            State::awaiting_code()
        } else {
            State::in_progress()
        }
    }

    fn act(&mut self, action: &JobAction) -> Outcome<State> {
        let result = self.engine.attempt_transition(&self.job, action);
        let outcome = match &result {
            Ok(decision) => {
                let next_status = decision.next_status();
                if next_status == JobStatus::CodeSent {
                    self.failed_code_attempts = 0;
                }
                self.job = self.job.with_stage(decision.next.clone());
                self.delivery = Delivery::Pending;
                info!(
                    booking_id = %self.job.id,
                    from = %decision.previous,
                    to = %next_status,
                    "Job moved to requested status"
                );
                Transition(Self::phase_for(next_status))
            }
            Err(_) => Handled,
        };
        self.last_outcome = Some(result);
        outcome
    }

    fn verify_code(&mut self, action: &JobAction) -> Outcome<State> {
        if let Some(limit) = self.engine.config().max_code_attempts {
            if self.failed_code_attempts >= limit {
                warn!(
                    booking_id = %self.job.id,
                    attempts = %self.failed_code_attempts,
                    "Completion code attempts exhausted"
                );
                self.last_outcome = Some(Err(ValidationError::TooManyCodeAttempts {
                    attempts: self.failed_code_attempts,
                }
                .into()));
                return Handled;
            }
        }

        let outcome = self.act(action);
        if let Some(Err(TransitionError::Validation(
            ValidationError::CompletionCodeMismatch | ValidationError::MalformedCompletionCode { .. },
        ))) = &self.last_outcome
        {
            self.failed_code_attempts += 1;
        }
        outcome
    }

    fn reconcile(&mut self, job: &Job) -> Outcome<State> {
        if job.id != self.job.id {
            warn!(
                expected = %self.job.id,
                actual = %job.id,
                "Ignoring refresh for a different job"
            );
            return Handled;
        }
        if job.status() != self.job.status() {
            info!(
                booking_id = %job.id,
                local = %self.job.status(),
                stored = %job.status(),
                "Session reconciled with store"
            );
            if job.status() != JobStatus::CodeSent {
                self.failed_code_attempts = 0;
            }
        }
        self.job = job.clone();
        self.delivery = Delivery::Idle;
        Transition(Self::phase_for(job.status()))
    }
}

#[state_machine(initial = "State::detached()")]
impl JobSession {
    /// Before the first reconcile the session has not seen the stored job.
    #[state]
    fn detached(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Reconcile(job) => self.reconcile(job),
            _ => Handled,
        }
    }

    #[state(superstate = "tracking")]
    fn in_progress(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Act(action) => self.act(action),
            _ => Super,
        }
    }

    #[state(superstate = "tracking")]
    fn awaiting_code(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Act(action @ JobAction::VerifyCompletionCode { .. }) => {
                self.verify_code(action)
            }
            SessionEvent::CodeAttemptsOnFile(attempts) => {
                self.failed_code_attempts = self.failed_code_attempts.max(*attempts);
                Handled
            }
            SessionEvent::Act(action) => self.act(action),
            _ => Super,
        }
    }

    #[state(superstate = "tracking")]
    fn finished(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Act(action) => {
                self.last_outcome = Some(Err(TransitionError::InvalidTransition {
                    status: self.job.status(),
                    action: action.kind(),
                }));
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn tracking(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Delivered => {
                self.delivery = Delivery::Confirmed;
                Handled
            }
            SessionEvent::DeliveryFailed { error } => {
                warn!(booking_id = %self.job.id, error = %error, "Request not stored");
                self.delivery = Delivery::Failed(error.clone());
                Handled
            }
            SessionEvent::Reconcile(job) => self.reconcile(job),
            SessionEvent::Act(_) | SessionEvent::CodeAttemptsOnFile(_) => Handled,
        }
    }
}

impl JobSession {
    /// Actions worth offering right now.
    pub fn available_actions(&self) -> &'static [ActionKind] {
        JobWorkflowEngine::allowed_actions(self.job.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::workflow::engine::fixtures::job_in;
    use rust_decimal::Decimal;

    fn verify(code: &str) -> SessionEvent {
        SessionEvent::Act(JobAction::VerifyCompletionCode {
            submitted: code.to_string(),
            on_file: "4321".to_string(),
        })
    }

    #[test]
    fn test_start_adopts_stored_status() {
        let machine = JobSession::start(JobWorkflowEngine::default(), job_in(JobStatus::OnTheWay));
        assert_eq!(machine.inner().job().status(), JobStatus::OnTheWay);
        assert_eq!(machine.inner().delivery(), &Delivery::Idle);
        assert_eq!(
            machine.inner().available_actions(),
            &[ActionKind::StartInspection]
        );
    }

    #[test]
    fn test_accepted_action_is_pending_until_delivered() {
        let mut machine =
            JobSession::start(JobWorkflowEngine::default(), job_in(JobStatus::Assigned));
        machine.handle(&SessionEvent::Act(JobAction::Accept));

        let session = machine.inner();
        assert_eq!(session.job().status(), JobStatus::Accepted);
        assert_eq!(session.delivery(), &Delivery::Pending);
        let request = session.pending_request().unwrap();
        assert_eq!(request.status_update.status, JobStatus::Accepted);

        machine.handle(&SessionEvent::Delivered);
        assert_eq!(machine.inner().delivery(), &Delivery::Confirmed);
        assert!(machine.inner().pending_request().is_none());
    }

    #[test]
    fn test_rejected_action_leaves_job_unchanged() {
        let job = job_in(JobStatus::Assigned);
        let mut machine = JobSession::start(JobWorkflowEngine::default(), job.clone());
        machine.handle(&SessionEvent::Act(JobAction::StartRepair));

        assert_eq!(machine.inner().job(), &job);
        assert!(matches!(
            machine.inner().last_outcome(),
            Some(Err(TransitionError::InvalidTransition { .. }))
        ));
        assert_eq!(machine.inner().delivery(), &Delivery::Idle);
    }

    #[test]
    fn test_failed_delivery_keeps_requested_stage_until_reconcile() {
        let stored = job_in(JobStatus::Assigned);
        let mut machine = JobSession::start(JobWorkflowEngine::default(), stored.clone());
        machine.handle(&SessionEvent::Act(JobAction::Accept));
        machine.handle(&SessionEvent::DeliveryFailed {
            error: "network unreachable".to_string(),
        });

        assert_eq!(machine.inner().job().status(), JobStatus::Accepted);
        assert_eq!(
            machine.inner().delivery(),
            &Delivery::Failed("network unreachable".to_string())
        );

        machine.handle(&SessionEvent::Reconcile(stored));
        assert_eq!(machine.inner().job().status(), JobStatus::Assigned);
        assert_eq!(machine.inner().delivery(), &Delivery::Idle);
    }

    #[test]
    fn test_finished_job_refuses_actions() {
        let mut machine =
            JobSession::start(JobWorkflowEngine::default(), job_in(JobStatus::RepairCompleted));
        machine.handle(&SessionEvent::Act(JobAction::CollectPayment {
            amount: Decimal::from(10),
            method: crate::payment::PaymentMethod::Cash,
        }));
        assert!(matches!(
            machine.inner().last_outcome(),
            Some(Err(TransitionError::InvalidTransition {
                status: JobStatus::RepairCompleted,
                action: ActionKind::CollectPayment
            }))
        ));
    }

    #[test]
    fn test_code_attempts_unlimited_by_default() {
        let mut machine = JobSession::start(JobWorkflowEngine::default(), job_in(JobStatus::CodeSent));
        for _ in 0..10 {
            machine.handle(&verify("1111"));
        }
        assert_eq!(machine.inner().failed_code_attempts(), 10);

        machine.handle(&verify("4321"));
        assert_eq!(machine.inner().job().status(), JobStatus::PaymentPending);
    }

    #[test]
    fn test_code_attempt_limit() {
        let engine = JobWorkflowEngine::new(WorkflowConfig {
            max_code_attempts: Some(3),
            ..WorkflowConfig::default()
        });
        let mut machine = JobSession::start(engine, job_in(JobStatus::CodeSent));
        for _ in 0..3 {
            machine.handle(&verify("1111"));
        }
        machine.handle(&verify("4321"));

        assert_eq!(machine.inner().job().status(), JobStatus::CodeSent);
        assert!(matches!(
            machine.inner().last_outcome(),
            Some(Err(TransitionError::Validation(
                ValidationError::TooManyCodeAttempts { attempts: 3 }
            )))
        ));
    }

    #[test]
    fn test_attempts_on_file_count_towards_limit() {
        let engine = JobWorkflowEngine::new(WorkflowConfig {
            max_code_attempts: Some(2),
            ..WorkflowConfig::default()
        });
        let mut machine = JobSession::start(engine, job_in(JobStatus::CodeSent));
        machine.handle(&SessionEvent::CodeAttemptsOnFile(2));
        machine.handle(&verify("4321"));

        assert_eq!(machine.inner().job().status(), JobStatus::CodeSent);
        assert!(matches!(
            machine.inner().last_outcome(),
            Some(Err(TransitionError::Validation(
                ValidationError::TooManyCodeAttempts { attempts: 2 }
            )))
        ));
    }

    #[test]
    fn test_attempts_on_file_ignored_outside_code_sent() {
        let mut machine = JobSession::start(JobWorkflowEngine::default(), job_in(JobStatus::Accepted));
        machine.handle(&SessionEvent::CodeAttemptsOnFile(5));
        assert_eq!(machine.inner().failed_code_attempts(), 0);
    }

    #[test]
    fn test_refresh_for_other_job_ignored() {
        let mut machine = JobSession::start(JobWorkflowEngine::default(), job_in(JobStatus::Accepted));
        let mut other = job_in(JobStatus::Completed);
        other.id = "BK-2002".to_string();
        machine.handle(&SessionEvent::Reconcile(other));
        assert_eq!(machine.inner().job().status(), JobStatus::Accepted);
    }
}
