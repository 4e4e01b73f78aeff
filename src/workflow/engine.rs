use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::action::{ActionKind, CustomerDecision, JobAction};
use super::error::{TransitionError, ValidationError};
use super::job::{InspectionReport, Job, JobStage, RepairDetails, Settlement};
use super::quote::build_quote;
use super::request::{
    AuxiliaryRequest, InspectionSubmission, QuoteSubmission, SideEffectRequest,
    StatusUpdateRequest,
};
use super::status::JobStatus;
use crate::config::WorkflowConfig;
use crate::payment::{PaymentMethod, PaymentReceipt};

pub const DEFAULT_CODE_LENGTH: usize = 4;

/// The outcome of an accepted transition: where the job goes and what has to
/// be written to the store to get it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDecision {
    pub previous: JobStatus,
    pub next: JobStage,
    pub request: SideEffectRequest,
}

impl TransitionDecision {
    pub fn next_status(&self) -> JobStatus {
        self.next.status()
    }
}

/// Decides which technician actions are legal for a job and shapes the
/// resulting store writes. Performs no I/O and keeps no per-job state, so
/// identical inputs always produce identical decisions.
#[derive(Debug, Clone)]
pub struct JobWorkflowEngine {
    config: WorkflowConfig,
}

impl Default for JobWorkflowEngine {
    fn default() -> Self {
        Self::new(WorkflowConfig::default())
    }
}

impl JobWorkflowEngine {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Technician actions the UI may offer for a job in `status`.
    pub fn allowed_actions(status: JobStatus) -> &'static [ActionKind] {
        match status {
            JobStatus::Assigned => &[ActionKind::Accept, ActionKind::Reject],
            JobStatus::Accepted => &[ActionKind::StartTravel],
            JobStatus::OnTheWay => &[ActionKind::StartInspection],
            JobStatus::InspectionStarted => &[ActionKind::SubmitInspection],
            JobStatus::InspectionCompleted => {
                &[ActionKind::ShareQuote, ActionKind::CollectDirectPayment]
            }
            JobStatus::QuotationApproved => &[ActionKind::StartRepair],
            JobStatus::RepairStarted => &[ActionKind::SubmitRepair],
            JobStatus::CodeSent => &[ActionKind::VerifyCompletionCode],
            JobStatus::PaymentPending => &[ActionKind::CollectPayment],
            // Waiting on the customer, or finished.
            JobStatus::QuotationShared
            | JobStatus::JobRejected
            | JobStatus::QuotationRejected
            | JobStatus::RepairCompleted
            | JobStatus::Completed
            | JobStatus::ClosedNoRepair
            | JobStatus::Cancelled => &[],
        }
    }

    pub fn attempt_transition(
        &self,
        job: &Job,
        action: &JobAction,
    ) -> Result<TransitionDecision, TransitionError> {
        let previous = job.status();
        let result = self.decide(job, action);

        match &result {
            Ok(decision) => debug!(
                booking_id = %job.id,
                from = %previous,
                to = %decision.next_status(),
                action = %action.kind(),
                "Transition accepted"
            ),
            Err(e) => debug!(
                booking_id = %job.id,
                status = %previous,
                action = %action.kind(),
                error = %e,
                "Transition rejected"
            ),
        }

        result
    }

    fn decide(&self, job: &Job, action: &JobAction) -> Result<TransitionDecision, TransitionError> {
        let previous = job.status();
        let invalid = || TransitionError::InvalidTransition {
            status: previous,
            action: action.kind(),
        };
        let status_update =
            |status: JobStatus, note: String| StatusUpdateRequest::new(&job.id, &job.order_id, status, note);

        let (next, status_update, auxiliary) = match (&job.stage, action) {
            (JobStage::Assigned, JobAction::Accept) => (
                JobStage::Accepted,
                status_update(JobStatus::Accepted, "Technician accepted the job".into()),
                None,
            ),
            (JobStage::Assigned, JobAction::Reject { reason }) => {
                let reason = non_blank(reason.clone());
                let note = reason
                    .clone()
                    .unwrap_or_else(|| "Technician rejected the job".into());
                (
                    JobStage::JobRejected { reason },
                    status_update(JobStatus::JobRejected, note),
                    None,
                )
            }
            (JobStage::Accepted, JobAction::StartTravel) => (
                JobStage::OnTheWay,
                status_update(JobStatus::OnTheWay, "Technician is on the way".into()),
                None,
            ),
            (JobStage::OnTheWay, JobAction::StartInspection) => (
                JobStage::InspectionStarted,
                status_update(JobStatus::InspectionStarted, "Inspection started".into()),
                None,
            ),
            (
                JobStage::InspectionStarted,
                JobAction::SubmitInspection {
                    findings,
                    fee,
                    notes,
                    photo_url,
                },
            ) => {
                let inspection = validate_inspection(findings, *fee, notes, photo_url)?;
                let note = format!("Inspection completed: {}", inspection.findings.join(", "));
                let submission = InspectionSubmission {
                    booking_id: job.id.clone(),
                    technician_id: job.technician_id.clone(),
                    inspection_fee: inspection.fee,
                    findings: inspection.findings.clone(),
                    notes: inspection.notes.clone(),
                    issue_image_url: inspection.photo_url.clone(),
                };
                (
                    JobStage::InspectionCompleted { inspection },
                    status_update(JobStatus::InspectionCompleted, note),
                    Some(AuxiliaryRequest::Inspection(submission)),
                )
            }
            (
                JobStage::InspectionCompleted { inspection },
                JobAction::ShareQuote {
                    labor_cost,
                    parts_cost,
                    notes,
                },
            ) => {
                let quote = build_quote(*labor_cost, *parts_cost, notes.clone())?;
                let submission = QuoteSubmission {
                    booking_id: job.id.clone(),
                    labor_cost: quote.labor_cost(),
                    parts_cost: quote.parts_cost(),
                    total_amount: quote.total_amount(),
                    notes: quote.notes().map(str::to_string),
                };
                let note = format!("Quotation shared for {}", quote.total_amount());
                (
                    JobStage::QuotationShared {
                        inspection: inspection.clone(),
                        quote,
                    },
                    status_update(JobStatus::QuotationShared, note),
                    Some(AuxiliaryRequest::Quote(submission)),
                )
            }
            (
                JobStage::InspectionCompleted { inspection },
                JobAction::CollectDirectPayment { amount, method },
            ) => {
                let payment = receipt(*amount, method)?;
                let mut update = status_update(
                    JobStatus::RepairCompleted,
                    format!("Payment of {} collected at inspection ({})", amount, method.label()),
                );
                update.final_cost = Some(payment.amount);
                update.final_amount_paid = Some(payment.amount);
                update.payment_method = Some(payment.method.clone());
                (
                    JobStage::RepairCompleted {
                        inspection: inspection.clone(),
                        settlement: Settlement::Direct { payment },
                    },
                    update,
                    None,
                )
            }
            (JobStage::QuotationApproved { inspection, quote }, JobAction::StartRepair) => (
                JobStage::RepairStarted {
                    inspection: inspection.clone(),
                    quote: quote.clone(),
                },
                status_update(JobStatus::RepairStarted, "Repair started".into()),
                None,
            ),
            (
                JobStage::RepairStarted { inspection, quote },
                JobAction::SubmitRepair {
                    final_cost,
                    spare_parts_used,
                    technician_notes,
                },
            ) => {
                require_positive("final_cost", *final_cost)?;
                let repair = RepairDetails {
                    final_cost: *final_cost,
                    spare_parts_used: non_blank(spare_parts_used.clone()),
                    technician_notes: non_blank(technician_notes.clone()),
                };
                let mut update = status_update(
                    JobStatus::CodeSent,
                    "Repair details submitted, completion code sent to customer".into(),
                );
                update.final_cost = Some(repair.final_cost);
                update.spare_parts_used = repair.spare_parts_used.clone();
                update.technician_notes = repair.technician_notes.clone();
                (
                    JobStage::CodeSent {
                        inspection: inspection.clone(),
                        quote: quote.clone(),
                        repair,
                    },
                    update,
                    None,
                )
            }
            (
                JobStage::CodeSent {
                    inspection,
                    quote,
                    repair,
                },
                JobAction::VerifyCompletionCode { submitted, on_file },
            ) => {
                let expected_len = self.config.completion_code_length;
                if !is_well_formed_code(submitted.trim(), expected_len) {
                    return Err(ValidationError::MalformedCompletionCode { expected_len }.into());
                }
                if !self.verify_completion_code(submitted.trim(), on_file) {
                    return Err(ValidationError::CompletionCodeMismatch.into());
                }
                (
                    JobStage::PaymentPending {
                        inspection: inspection.clone(),
                        quote: quote.clone(),
                        repair: repair.clone(),
                    },
                    status_update(JobStatus::PaymentPending, "Completion code verified".into()),
                    None,
                )
            }
            (
                JobStage::PaymentPending {
                    inspection,
                    quote,
                    repair,
                },
                JobAction::CollectPayment { amount, method },
            ) => {
                let payment = receipt(*amount, method)?;
                let mut update = status_update(
                    JobStatus::RepairCompleted,
                    format!("Payment of {} collected ({})", amount, method.label()),
                );
                update.final_amount_paid = Some(payment.amount);
                update.payment_method = Some(payment.method.clone());
                (
                    JobStage::RepairCompleted {
                        inspection: inspection.clone(),
                        settlement: Settlement::Repaired {
                            quote: quote.clone(),
                            repair: repair.clone(),
                            payment,
                        },
                    },
                    update,
                    None,
                )
            }
            _ => return Err(invalid()),
        };

        Ok(TransitionDecision {
            previous,
            next,
            request: SideEffectRequest {
                status_update,
                auxiliary,
            },
        })
    }

    /// Apply the customer's answer to a shared quote. The customer app writes
    /// the status itself, so no request is produced.
    pub fn observe_customer_decision(
        &self,
        job: &Job,
        decision: CustomerDecision,
    ) -> Result<JobStage, TransitionError> {
        match (&job.stage, decision) {
            (JobStage::QuotationShared { inspection, quote }, CustomerDecision::Approve) => {
                Ok(JobStage::QuotationApproved {
                    inspection: inspection.clone(),
                    quote: quote.clone(),
                })
            }
            (JobStage::QuotationShared { inspection, quote }, CustomerDecision::Reject) => {
                Ok(JobStage::QuotationRejected {
                    inspection: inspection.clone(),
                    quote: quote.clone(),
                })
            }
            _ => Err(TransitionError::InvalidTransition {
                status: job.status(),
                // Closest technician-side step; customer decisions have no kind of their own.
                action: ActionKind::ShareQuote,
            }),
        }
    }

    /// Exact match against the code on file, using the configured length.
    pub fn verify_completion_code(&self, submitted: &str, on_file: &str) -> bool {
        let len = self.config.completion_code_length;
        is_well_formed_code(submitted, len) && is_well_formed_code(on_file, len) && submitted == on_file
    }

    /// Technician payout for `final_cost` at the configured platform fee.
    pub fn payout(&self, final_cost: Decimal) -> Result<Decimal, ValidationError> {
        compute_payout(final_cost, self.config.platform_fee_percent)
    }
}

/// Exact match on two well-formed four-digit codes.
pub fn verify_completion_code(submitted: &str, on_file: &str) -> bool {
    is_well_formed_code(submitted, DEFAULT_CODE_LENGTH)
        && is_well_formed_code(on_file, DEFAULT_CODE_LENGTH)
        && submitted == on_file
}

/// `final_cost - final_cost * fee_percent / 100`, rounded to paise.
pub fn compute_payout(final_cost: Decimal, fee_percent: Decimal) -> Result<Decimal, ValidationError> {
    if final_cost < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field: "final_cost",
            value: final_cost,
        });
    }
    if fee_percent < Decimal::ZERO || fee_percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::FeeOutOfRange(fee_percent));
    }

    let fee = final_cost
        .checked_mul(fee_percent)
        .and_then(|gross| gross.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(ValidationError::AmountOutOfRange {
            field: "platform_fee",
        })?;
    Ok((final_cost - fee).round_dp(2))
}

pub(crate) fn is_well_formed_code(code: &str, len: usize) -> bool {
    code.len() == len && code.bytes().all(|b| b.is_ascii_digit())
}

fn validate_inspection(
    findings: &[String],
    fee: Decimal,
    notes: &Option<String>,
    photo_url: &Option<String>,
) -> Result<InspectionReport, ValidationError> {
    let findings: Vec<String> = findings
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    if findings.is_empty() {
        return Err(ValidationError::EmptyFindings);
    }
    if fee < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field: "inspection_fee",
            value: fee,
        });
    }

    Ok(InspectionReport {
        findings,
        notes: non_blank(notes.clone()),
        photo_url: non_blank(photo_url.clone()),
        fee,
    })
}

fn require_positive(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount { field, value });
    }
    Ok(())
}

fn receipt(amount: Decimal, method: &PaymentMethod) -> Result<PaymentReceipt, ValidationError> {
    require_positive("amount", amount)?;
    Ok(PaymentReceipt {
        amount,
        method: method.clone(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
