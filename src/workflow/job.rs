use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quote::Quote;
use super::status::JobStatus;
use crate::payment::PaymentReceipt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// What the technician recorded after the on-site assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairDetails {
    pub final_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spare_parts_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician_notes: Option<String>,
}

/// How a settled job ended up being paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum Settlement {
    /// Collected at the inspection stage; no quote or repair followed.
    Direct { payment: PaymentReceipt },
    Repaired {
        quote: Quote,
        repair: RepairDetails,
        payment: PaymentReceipt,
    },
}

impl Settlement {
    /// The job's final cost. On the direct path this is the amount collected.
    pub fn final_cost(&self) -> Decimal {
        match self {
            Settlement::Direct { payment } => payment.amount,
            Settlement::Repaired { repair, .. } => repair.final_cost,
        }
    }

    pub fn payment(&self) -> &PaymentReceipt {
        match self {
            Settlement::Direct { payment } | Settlement::Repaired { payment, .. } => payment,
        }
    }
}

/// Job data that only exists from a given status onwards.
///
/// Each variant carries exactly the fields that are valid for its status, so a
/// job that has not been quoted cannot have a quote and a settled job always
/// has a final cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStage {
    Assigned,
    JobRejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Accepted,
    OnTheWay,
    InspectionStarted,
    InspectionCompleted {
        inspection: InspectionReport,
    },
    QuotationShared {
        inspection: InspectionReport,
        quote: Quote,
    },
    QuotationApproved {
        inspection: InspectionReport,
        quote: Quote,
    },
    QuotationRejected {
        inspection: InspectionReport,
        quote: Quote,
    },
    RepairStarted {
        inspection: InspectionReport,
        quote: Quote,
    },
    CodeSent {
        inspection: InspectionReport,
        quote: Quote,
        repair: RepairDetails,
    },
    PaymentPending {
        inspection: InspectionReport,
        quote: Quote,
        repair: RepairDetails,
    },
    RepairCompleted {
        inspection: InspectionReport,
        settlement: Settlement,
    },
    Completed {
        inspection: InspectionReport,
        settlement: Settlement,
    },
    ClosedNoRepair {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inspection: Option<InspectionReport>,
    },
    Cancelled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl JobStage {
    pub fn status(&self) -> JobStatus {
        match self {
            JobStage::Assigned => JobStatus::Assigned,
            JobStage::JobRejected { .. } => JobStatus::JobRejected,
            JobStage::Accepted => JobStatus::Accepted,
            JobStage::OnTheWay => JobStatus::OnTheWay,
            JobStage::InspectionStarted => JobStatus::InspectionStarted,
            JobStage::InspectionCompleted { .. } => JobStatus::InspectionCompleted,
            JobStage::QuotationShared { .. } => JobStatus::QuotationShared,
            JobStage::QuotationApproved { .. } => JobStatus::QuotationApproved,
            JobStage::QuotationRejected { .. } => JobStatus::QuotationRejected,
            JobStage::RepairStarted { .. } => JobStatus::RepairStarted,
            JobStage::CodeSent { .. } => JobStatus::CodeSent,
            JobStage::PaymentPending { .. } => JobStatus::PaymentPending,
            JobStage::RepairCompleted { .. } => JobStatus::RepairCompleted,
            JobStage::Completed { .. } => JobStatus::Completed,
            JobStage::ClosedNoRepair { .. } => JobStatus::ClosedNoRepair,
            JobStage::Cancelled { .. } => JobStatus::Cancelled,
        }
    }

    pub fn inspection(&self) -> Option<&InspectionReport> {
        match self {
            JobStage::InspectionCompleted { inspection }
            | JobStage::QuotationShared { inspection, .. }
            | JobStage::QuotationApproved { inspection, .. }
            | JobStage::QuotationRejected { inspection, .. }
            | JobStage::RepairStarted { inspection, .. }
            | JobStage::CodeSent { inspection, .. }
            | JobStage::PaymentPending { inspection, .. }
            | JobStage::RepairCompleted { inspection, .. }
            | JobStage::Completed { inspection, .. } => Some(inspection),
            JobStage::ClosedNoRepair { inspection } => inspection.as_ref(),
            _ => None,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            JobStage::QuotationShared { quote, .. }
            | JobStage::QuotationApproved { quote, .. }
            | JobStage::QuotationRejected { quote, .. }
            | JobStage::RepairStarted { quote, .. }
            | JobStage::CodeSent { quote, .. }
            | JobStage::PaymentPending { quote, .. } => Some(quote),
            JobStage::RepairCompleted { settlement, .. } | JobStage::Completed { settlement, .. } => {
                match settlement {
                    Settlement::Repaired { quote, .. } => Some(quote),
                    Settlement::Direct { .. } => None,
                }
            }
            _ => None,
        }
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        match self {
            JobStage::RepairCompleted { settlement, .. } | JobStage::Completed { settlement, .. } => {
                Some(settlement)
            }
            _ => None,
        }
    }

    /// Set once repair details are submitted (or at direct collection) and
    /// carried unchanged into every later stage.
    pub fn final_cost(&self) -> Option<Decimal> {
        match self {
            JobStage::CodeSent { repair, .. } | JobStage::PaymentPending { repair, .. } => {
                Some(repair.final_cost)
            }
            JobStage::RepairCompleted { settlement, .. } | JobStage::Completed { settlement, .. } => {
                Some(settlement.final_cost())
            }
            _ => None,
        }
    }
}

/// A single repair engagement assigned to one technician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub order_id: String,
    pub technician_id: String,
    pub customer: Customer,
    pub category: String,
    pub issue: String,
    pub assigned_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stage: JobStage,
}

impl Job {
    /// A freshly dispatched job, as the matching service creates it.
    pub fn assigned(
        id: impl Into<String>,
        order_id: impl Into<String>,
        technician_id: impl Into<String>,
        customer: Customer,
        category: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            order_id: order_id.into(),
            technician_id: technician_id.into(),
            customer,
            category: category.into(),
            issue: issue.into(),
            assigned_at: Utc::now(),
            stage: JobStage::Assigned,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.stage.status()
    }

    /// Same job, advanced to `stage`. Identity fields are never touched.
    pub fn with_stage(&self, stage: JobStage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }
}
