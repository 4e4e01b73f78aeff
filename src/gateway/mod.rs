// Boundaries to the services the workflow depends on: the job-record store,
// customer notification delivery, and the identity provider.
//
// Each is a trait injected into the dispatcher so tests can swap in mocks.

pub mod auth;
pub mod notifier;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::workflow::{
    Customer, InspectionSubmission, Job, QuoteSubmission, StatusUpdateRequest,
};

pub use auth::{Role, Session, StaticAuthProvider};
pub use notifier::LogNotifier;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(String),
    /// The store refused the write; the message is shown to the user as-is.
    #[error("{0}")]
    Rejected(String),
    #[error("stored job {booking_id} is inconsistent: {reason}")]
    InvalidRecord { booking_id: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("could not reach customer {phone}: {reason}")]
    Undeliverable { phone: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no signed-in session")]
    NoSession,
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Persistent job rows. Writes are all-or-nothing per call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn fetch_job(&self, booking_id: &str) -> Result<Job, StoreError>;

    async fn list_jobs(&self, technician_id: &str) -> Result<Vec<Job>, StoreError>;

    async fn update_status(&self, request: &StatusUpdateRequest) -> Result<(), StoreError>;

    async fn save_inspection(&self, submission: &InspectionSubmission) -> Result<(), StoreError>;

    async fn share_quote(&self, submission: &QuoteSubmission) -> Result<(), StoreError>;

    /// Code the customer received for this job, if one has been issued.
    async fn completion_code(&self, booking_id: &str) -> Result<Option<String>, StoreError>;

    /// Wrong codes entered since the current code was issued.
    async fn failed_code_attempts(&self, booking_id: &str) -> Result<u32, StoreError>;

    /// Count one more wrong code and return the new total.
    async fn record_failed_code_attempt(&self, booking_id: &str) -> Result<u32, StoreError>;
}

#[async_trait]
impl<T: JobStore + ?Sized> JobStore for Arc<T> {
    async fn fetch_job(&self, booking_id: &str) -> Result<Job, StoreError> {
        (**self).fetch_job(booking_id).await
    }

    async fn list_jobs(&self, technician_id: &str) -> Result<Vec<Job>, StoreError> {
        (**self).list_jobs(technician_id).await
    }

    async fn update_status(&self, request: &StatusUpdateRequest) -> Result<(), StoreError> {
        (**self).update_status(request).await
    }

    async fn save_inspection(&self, submission: &InspectionSubmission) -> Result<(), StoreError> {
        (**self).save_inspection(submission).await
    }

    async fn share_quote(&self, submission: &QuoteSubmission) -> Result<(), StoreError> {
        (**self).share_quote(submission).await
    }

    async fn completion_code(&self, booking_id: &str) -> Result<Option<String>, StoreError> {
        (**self).completion_code(booking_id).await
    }

    async fn failed_code_attempts(&self, booking_id: &str) -> Result<u32, StoreError> {
        (**self).failed_code_attempts(booking_id).await
    }

    async fn record_failed_code_attempt(&self, booking_id: &str) -> Result<u32, StoreError> {
        (**self).record_failed_code_attempt(booking_id).await
    }
}

/// Out-of-band delivery to the customer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotifierGateway: Send + Sync {
    async fn send_completion_code(
        &self,
        booking_id: &str,
        customer: &Customer,
    ) -> Result<(), NotifierError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_session(&self) -> Result<Session, AuthError>;
}
