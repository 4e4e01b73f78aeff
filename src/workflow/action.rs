use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::payment::PaymentMethod;

/// Something the technician asks to do with a job, together with the data
/// that step needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JobAction {
    Accept,
    Reject {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    StartTravel,
    StartInspection,
    SubmitInspection {
        findings: Vec<String>,
        fee: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        photo_url: Option<String>,
    },
    ShareQuote {
        labor_cost: Decimal,
        parts_cost: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// Take payment at the inspection stage when no repair follows.
    CollectDirectPayment {
        amount: Decimal,
        method: PaymentMethod,
    },
    StartRepair,
    SubmitRepair {
        final_cost: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spare_parts_used: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        technician_notes: Option<String>,
    },
    VerifyCompletionCode {
        submitted: String,
        on_file: String,
    },
    CollectPayment {
        amount: Decimal,
        method: PaymentMethod,
    },
}

impl JobAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            JobAction::Accept => ActionKind::Accept,
            JobAction::Reject { .. } => ActionKind::Reject,
            JobAction::StartTravel => ActionKind::StartTravel,
            JobAction::StartInspection => ActionKind::StartInspection,
            JobAction::SubmitInspection { .. } => ActionKind::SubmitInspection,
            JobAction::ShareQuote { .. } => ActionKind::ShareQuote,
            JobAction::CollectDirectPayment { .. } => ActionKind::CollectDirectPayment,
            JobAction::StartRepair => ActionKind::StartRepair,
            JobAction::SubmitRepair { .. } => ActionKind::SubmitRepair,
            JobAction::VerifyCompletionCode { .. } => ActionKind::VerifyCompletionCode,
            JobAction::CollectPayment { .. } => ActionKind::CollectPayment,
        }
    }
}

/// Payload-free name of a [`JobAction`], used for gating buttons and in
/// error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Accept,
    Reject,
    StartTravel,
    StartInspection,
    SubmitInspection,
    ShareQuote,
    CollectDirectPayment,
    StartRepair,
    SubmitRepair,
    VerifyCompletionCode,
    CollectPayment,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Accept => "accept",
            ActionKind::Reject => "reject",
            ActionKind::StartTravel => "start_travel",
            ActionKind::StartInspection => "start_inspection",
            ActionKind::SubmitInspection => "submit_inspection",
            ActionKind::ShareQuote => "share_quote",
            ActionKind::CollectDirectPayment => "collect_direct_payment",
            ActionKind::StartRepair => "start_repair",
            ActionKind::SubmitRepair => "submit_repair",
            ActionKind::VerifyCompletionCode => "verify_completion_code",
            ActionKind::CollectPayment => "collect_payment",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The customer's answer to a shared quote. Arrives from the store, never
/// from the technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerDecision {
    Approve,
    Reject,
}
