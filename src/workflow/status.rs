use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every status a job row can carry.
///
/// The wire form is the snake_case name used by the job-record store
/// (`"on_the_way"`, `"code_sent"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Assigned,
    JobRejected,
    Accepted,
    OnTheWay,
    InspectionStarted,
    InspectionCompleted,
    QuotationShared,
    QuotationApproved,
    QuotationRejected,
    RepairStarted,
    CodeSent,
    PaymentPending,
    RepairCompleted,
    Completed,
    ClosedNoRepair,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 16] = [
        JobStatus::Assigned,
        JobStatus::JobRejected,
        JobStatus::Accepted,
        JobStatus::OnTheWay,
        JobStatus::InspectionStarted,
        JobStatus::InspectionCompleted,
        JobStatus::QuotationShared,
        JobStatus::QuotationApproved,
        JobStatus::QuotationRejected,
        JobStatus::RepairStarted,
        JobStatus::CodeSent,
        JobStatus::PaymentPending,
        JobStatus::RepairCompleted,
        JobStatus::Completed,
        JobStatus::ClosedNoRepair,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Assigned => "assigned",
            JobStatus::JobRejected => "job_rejected",
            JobStatus::Accepted => "accepted",
            JobStatus::OnTheWay => "on_the_way",
            JobStatus::InspectionStarted => "inspection_started",
            JobStatus::InspectionCompleted => "inspection_completed",
            JobStatus::QuotationShared => "quotation_shared",
            JobStatus::QuotationApproved => "quotation_approved",
            JobStatus::QuotationRejected => "quotation_rejected",
            JobStatus::RepairStarted => "repair_started",
            JobStatus::CodeSent => "code_sent",
            JobStatus::PaymentPending => "payment_pending",
            JobStatus::RepairCompleted => "repair_completed",
            JobStatus::Completed => "completed",
            JobStatus::ClosedNoRepair => "closed_no_repair",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal jobs accept no further technician action and are kept only
    /// for earnings and audit history.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::JobRejected
                | JobStatus::QuotationRejected
                | JobStatus::RepairCompleted
                | JobStatus::Completed
                | JobStatus::ClosedNoRepair
                | JobStatus::Cancelled
        )
    }

    /// Whether money has changed hands for a job in this status.
    pub fn is_settled(&self) -> bool {
        matches!(self, JobStatus::RepairCompleted | JobStatus::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
