use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::gateway::StoreError;
use crate::payment::{PaymentMethod, PaymentReceipt};
use crate::workflow::{
    build_quote, Customer, InspectionReport, InspectionSubmission, Job, JobStage, JobStatus,
    Quote, QuoteSubmission, RepairDetails, Settlement, StatusUpdateRequest,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNote {
    pub status: JobStatus,
    pub note: String,
    pub at: DateTime<Utc>,
}

/// A job row as the backend stores it: one flat record whose optional
/// columns fill in as the job advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub order_id: String,
    pub technician_id: String,
    pub customer: Customer,
    pub category: String,
    pub issue: String,
    pub assigned_at: DateTime<Utc>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inspection_findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spare_parts_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_amount_paid: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub history: Vec<StatusNote>,
}

impl JobRecord {
    fn invalid(&self, reason: impl Into<String>) -> StoreError {
        StoreError::InvalidRecord {
            booking_id: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn inspection(&self) -> Result<InspectionReport, StoreError> {
        let fee = self
            .inspection_fee
            .ok_or_else(|| self.invalid("inspection fee missing"))?;
        if self.inspection_findings.is_empty() {
            return Err(self.invalid("inspection findings missing"));
        }
        Ok(InspectionReport {
            findings: self.inspection_findings.clone(),
            notes: self.inspection_notes.clone(),
            photo_url: self.issue_image_url.clone(),
            fee,
        })
    }

    fn quote(&self) -> Result<Quote, StoreError> {
        let (labor, parts) = match (self.labor_cost, self.parts_cost) {
            (Some(labor), Some(parts)) => (labor, parts),
            _ => return Err(self.invalid("quote costs missing")),
        };
        let quote = build_quote(labor, parts, self.quote_notes.clone())
            .map_err(|e| self.invalid(e.to_string()))?;
        if let Some(total) = self.quote_total {
            if total != quote.total_amount() {
                return Err(self.invalid(format!(
                    "quote total {total} does not equal labor + parts ({})",
                    quote.total_amount()
                )));
            }
        }
        Ok(quote)
    }

    fn repair(&self) -> Result<RepairDetails, StoreError> {
        let final_cost = self
            .final_cost
            .ok_or_else(|| self.invalid("final cost missing"))?;
        Ok(RepairDetails {
            final_cost,
            spare_parts_used: self.spare_parts_used.clone(),
            technician_notes: self.technician_notes.clone(),
        })
    }

    fn settlement(&self) -> Result<Settlement, StoreError> {
        let amount = self
            .final_amount_paid
            .ok_or_else(|| self.invalid("amount paid missing"))?;
        let payment = PaymentReceipt {
            amount,
            method: self.payment_method.clone().unwrap_or(PaymentMethod::Cash),
        };

        if self.labor_cost.is_some() {
            return Ok(Settlement::Repaired {
                quote: self.quote()?,
                repair: self.repair()?,
                payment,
            });
        }
        match self.final_cost {
            Some(cost) if cost != amount => Err(self.invalid(format!(
                "direct collection of {amount} disagrees with final cost {cost}"
            ))),
            _ => Ok(Settlement::Direct { payment }),
        }
    }

    /// Rebuild the typed job, failing when a column its status needs is absent.
    pub fn to_job(&self) -> Result<Job, StoreError> {
        let stage = match self.status {
            JobStatus::Assigned => JobStage::Assigned,
            JobStatus::JobRejected => JobStage::JobRejected {
                reason: self.status_reason.clone(),
            },
            JobStatus::Accepted => JobStage::Accepted,
            JobStatus::OnTheWay => JobStage::OnTheWay,
            JobStatus::InspectionStarted => JobStage::InspectionStarted,
            JobStatus::InspectionCompleted => JobStage::InspectionCompleted {
                inspection: self.inspection()?,
            },
            JobStatus::QuotationShared => JobStage::QuotationShared {
                inspection: self.inspection()?,
                quote: self.quote()?,
            },
            JobStatus::QuotationApproved => JobStage::QuotationApproved {
                inspection: self.inspection()?,
                quote: self.quote()?,
            },
            JobStatus::QuotationRejected => JobStage::QuotationRejected {
                inspection: self.inspection()?,
                quote: self.quote()?,
            },
            JobStatus::RepairStarted => JobStage::RepairStarted {
                inspection: self.inspection()?,
                quote: self.quote()?,
            },
            JobStatus::CodeSent => JobStage::CodeSent {
                inspection: self.inspection()?,
                quote: self.quote()?,
                repair: self.repair()?,
            },
            JobStatus::PaymentPending => JobStage::PaymentPending {
                inspection: self.inspection()?,
                quote: self.quote()?,
                repair: self.repair()?,
            },
            JobStatus::RepairCompleted => JobStage::RepairCompleted {
                inspection: self.inspection()?,
                settlement: self.settlement()?,
            },
            JobStatus::Completed => JobStage::Completed {
                inspection: self.inspection()?,
                settlement: self.settlement()?,
            },
            JobStatus::ClosedNoRepair => JobStage::ClosedNoRepair {
                inspection: match self.inspection_fee {
                    Some(_) => Some(self.inspection()?),
                    None => None,
                },
            },
            JobStatus::Cancelled => JobStage::Cancelled {
                reason: self.status_reason.clone(),
            },
        };

        Ok(Job {
            id: self.id.clone(),
            order_id: self.order_id.clone(),
            technician_id: self.technician_id.clone(),
            customer: self.customer.clone(),
            category: self.category.clone(),
            issue: self.issue.clone(),
            assigned_at: self.assigned_at,
            stage,
        })
    }

    pub fn apply_status_update(
        &mut self,
        request: &StatusUpdateRequest,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if request.order_id != self.order_id {
            return Err(StoreError::Rejected(format!(
                "order {} does not belong to booking {}",
                request.order_id, self.id
            )));
        }
        if let Some(cost) = request.final_cost {
            match self.final_cost {
                Some(existing) if existing != cost => {
                    return Err(StoreError::Rejected(format!(
                        "final cost already recorded as {existing}"
                    )))
                }
                _ => self.final_cost = Some(cost),
            }
        }
        if let Some(paid) = request.final_amount_paid {
            if self.final_amount_paid.is_some() {
                return Err(StoreError::Rejected("payment already recorded".to_string()));
            }
            self.final_amount_paid = Some(paid);
            self.payment_method = request.payment_method.clone();
        }
        if request.spare_parts_used.is_some() {
            self.spare_parts_used = request.spare_parts_used.clone();
        }
        if request.technician_notes.is_some() {
            self.technician_notes = request.technician_notes.clone();
        }
        if matches!(request.status, JobStatus::JobRejected | JobStatus::Cancelled) {
            self.status_reason = Some(request.note.clone());
        }

        self.status = request.status;
        self.history.push(StatusNote {
            status: request.status,
            note: request.note.clone(),
            at,
        });
        Ok(())
    }

    /// Written once the status has moved past `inspection_started`; until then
    /// a resubmission replaces the earlier one.
    pub fn apply_inspection(&mut self, submission: &InspectionSubmission) -> Result<(), StoreError> {
        if self.inspection_fee.is_some() && self.status != JobStatus::InspectionStarted {
            let same = self.inspection_fee == Some(submission.inspection_fee)
                && self.inspection_findings == submission.findings;
            return if same {
                Ok(())
            } else {
                Err(StoreError::Rejected("inspection already recorded".to_string()))
            };
        }
        self.inspection_fee = Some(submission.inspection_fee);
        self.inspection_findings = submission.findings.clone();
        self.inspection_notes = submission.notes.clone();
        self.issue_image_url = submission.issue_image_url.clone();
        Ok(())
    }

    /// Written once the status has moved past `inspection_completed`; until
    /// then a resubmission replaces the earlier one.
    pub fn apply_quote(&mut self, submission: &QuoteSubmission) -> Result<(), StoreError> {
        if submission.labor_cost.checked_add(submission.parts_cost) != Some(submission.total_amount) {
            return Err(StoreError::Rejected(
                "quote total must equal labor + parts".to_string(),
            ));
        }
        if self.labor_cost.is_some() && self.status != JobStatus::InspectionCompleted {
            let same = self.labor_cost == Some(submission.labor_cost)
                && self.parts_cost == Some(submission.parts_cost);
            return if same {
                Ok(())
            } else {
                Err(StoreError::Rejected("quote already recorded".to_string()))
            };
        }
        self.labor_cost = Some(submission.labor_cost);
        self.parts_cost = Some(submission.parts_cost);
        self.quote_total = Some(submission.total_amount);
        self.quote_notes = submission.notes.clone();
        Ok(())
    }
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        let mut record = JobRecord {
            id: job.id.clone(),
            order_id: job.order_id.clone(),
            technician_id: job.technician_id.clone(),
            customer: job.customer.clone(),
            category: job.category.clone(),
            issue: job.issue.clone(),
            assigned_at: job.assigned_at,
            status: job.status(),
            status_reason: None,
            inspection_findings: Vec::new(),
            inspection_fee: None,
            inspection_notes: None,
            issue_image_url: None,
            labor_cost: None,
            parts_cost: None,
            quote_total: None,
            quote_notes: None,
            final_cost: job.stage.final_cost(),
            spare_parts_used: None,
            technician_notes: None,
            final_amount_paid: None,
            payment_method: None,
            history: Vec::new(),
        };

        match &job.stage {
            JobStage::JobRejected { reason } | JobStage::Cancelled { reason } => {
                record.status_reason = reason.clone();
            }
            _ => {}
        }
        if let Some(inspection) = job.stage.inspection() {
            record.inspection_findings = inspection.findings.clone();
            record.inspection_fee = Some(inspection.fee);
            record.inspection_notes = inspection.notes.clone();
            record.issue_image_url = inspection.photo_url.clone();
        }
        if let Some(quote) = job.stage.quote() {
            record.labor_cost = Some(quote.labor_cost());
            record.parts_cost = Some(quote.parts_cost());
            record.quote_total = Some(quote.total_amount());
            record.quote_notes = quote.notes().map(str::to_string);
        }
        let repair = match &job.stage {
            JobStage::CodeSent { repair, .. } | JobStage::PaymentPending { repair, .. } => Some(repair),
            JobStage::RepairCompleted { settlement, .. } | JobStage::Completed { settlement, .. } => {
                match settlement {
                    Settlement::Repaired { repair, .. } => Some(repair),
                    Settlement::Direct { .. } => None,
                }
            }
            _ => None,
        };
        if let Some(repair) = repair {
            record.spare_parts_used = repair.spare_parts_used.clone();
            record.technician_notes = repair.technician_notes.clone();
        }
        if let Some(settlement) = job.stage.settlement() {
            record.final_amount_paid = Some(settlement.payment().amount);
            record.payment_method = Some(settlement.payment().method.clone());
        }

        record
    }
}
