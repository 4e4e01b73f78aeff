use rust_decimal::Decimal;
use thiserror::Error;

use super::action::ActionKind;
use super::status::JobStatus;

/// A payload failed one of the transition guards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("inspection findings must list at least one issue")]
    EmptyFindings,
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("{field} must be greater than zero, got {value}")]
    NonPositiveAmount { field: &'static str, value: Decimal },
    #[error("{field} is too large to compute")]
    AmountOutOfRange { field: &'static str },
    #[error("platform fee must be between 0 and 100 percent, got {0}")]
    FeeOutOfRange(Decimal),
    #[error("completion code must be exactly {expected_len} digits")]
    MalformedCompletionCode { expected_len: usize },
    #[error("completion code does not match")]
    CompletionCodeMismatch,
    #[error("completion code attempts exhausted after {attempts} tries")]
    TooManyCodeAttempts { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{action} is not allowed while the job is {status}")]
    InvalidTransition { status: JobStatus, action: ActionKind },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl TransitionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, TransitionError::Validation(_))
    }
}
