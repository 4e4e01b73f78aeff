use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::JobStatus;
use crate::payment::PaymentMethod;

/// The one status write every accepted transition sends to the job store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub booking_id: String,
    pub order_id: String,
    pub status: JobStatus,
    pub note: String,
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
}

impl StatusUpdateRequest {
    pub fn new(
        booking_id: impl Into<String>,
        order_id: impl Into<String>,
        status: JobStatus,
        note: impl Into<String>,
    ) -> Self {
        Self {
            booking_id: booking_id.into(),
            order_id: order_id.into(),
            status,
            note: note.into(),
            final_cost: None,
            spare_parts_used: None,
            technician_notes: None,
            final_amount_paid: None,
            payment_method: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSubmission {
    pub booking_id: String,
    pub technician_id: String,
    pub inspection_fee: Decimal,
    pub findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    pub booking_id: String,
    pub labor_cost: Decimal,
    pub parts_cost: Decimal,
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload written alongside the status update for the steps that record
/// more than a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuxiliaryRequest {
    Inspection(InspectionSubmission),
    Quote(QuoteSubmission),
}

/// Everything one accepted transition asks the outside world to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectRequest {
    pub status_update: StatusUpdateRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<AuxiliaryRequest>,
}
