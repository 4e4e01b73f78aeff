// fieldfix - technician-side workflow for on-site repair jobs.
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod earnings;
pub mod gateway;
pub mod metrics;
pub mod payment;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::FieldFixConfig;
pub use dispatch::{DispatchError, JobDispatcher};
pub use earnings::{EarningsEntry, EarningsSummary};
pub use gateway::{
    AuthError, AuthProvider, JobStore, LogNotifier, NotifierError, NotifierGateway, Role,
    Session, StaticAuthProvider, StoreError,
};
pub use metrics::{DispatchMetrics, DispatchStats, OperationTimer};
pub use payment::{generate_completion_code, upi_link, PaymentMethod, PaymentReceipt};
pub use session::{Delivery, JobSession, SessionEvent, SessionMachine};
pub use store::JsonFileJobStore;
pub use telemetry::{create_transition_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    build_quote, compute_payout, verify_completion_code, ActionKind, CustomerDecision, Job,
    JobAction, JobStage, JobStatus, JobWorkflowEngine, Quote, SideEffectRequest,
    TransitionDecision, TransitionError, ValidationError,
};
