// Job workflow - the technician-side status pipeline for a single repair job.
//
// Everything in here is pure: the engine decides and shapes requests, and
// callers own all I/O.

pub mod action;
pub mod engine;
pub mod error;
pub mod job;
pub mod quote;
pub mod request;
pub mod status;

pub use action::{ActionKind, CustomerDecision, JobAction};
pub use engine::{
    compute_payout, verify_completion_code, JobWorkflowEngine, TransitionDecision,
    DEFAULT_CODE_LENGTH,
};
pub use error::{TransitionError, ValidationError};
pub use job::{Customer, InspectionReport, Job, JobStage, RepairDetails, Settlement};
pub use quote::{build_quote, Quote};
pub use request::{
    AuxiliaryRequest, InspectionSubmission, QuoteSubmission, SideEffectRequest,
    StatusUpdateRequest,
};
pub use status::JobStatus;
