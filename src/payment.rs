// Payment collection helpers: how money was taken, the UPI deep link shown
// to the customer, and the completion code handed to the customer.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::PaymentConfig;
use crate::workflow::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    /// Confirmed by the technician after the customer paid through a UPI app.
    Upi {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transaction_ref: Option<String>,
    },
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi { .. } => "upi",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi {
                transaction_ref: None,
            }),
            other => Err(format!("unknown payment method '{other}' (expected cash or upi)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub amount: Decimal,
    #[serde(flatten)]
    pub method: PaymentMethod,
}

/// Build the `upi://pay` deep link a customer scans or taps to pay.
pub fn upi_link(
    config: &PaymentConfig,
    amount: Decimal,
    booking_id: &str,
) -> Result<String, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount {
            field: "amount",
            value: amount,
        });
    }

    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    let note = format!("Repair job {booking_id}");

    Ok(format!(
        "upi://pay?pa={}&pn={}&am={}&cu={}&tn={}",
        urlencoding::encode(&config.upi_vpa),
        urlencoding::encode(&config.payee_name),
        amount,
        urlencoding::encode(&config.currency),
        urlencoding::encode(&note),
    ))
}

/// Random numeric code sent to the customer once repair details are in.
pub fn generate_completion_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_config() -> PaymentConfig {
        PaymentConfig {
            upi_vpa: "fixit@okbank".to_string(),
            payee_name: "FixIt Services".to_string(),
            currency: "INR".to_string(),
        }
    }

    #[test]
    fn test_upi_link_encodes_fields() {
        let link = upi_link(&payment_config(), Decimal::from(1700), "BK-42").unwrap();
        assert_eq!(
            link,
            "upi://pay?pa=fixit%40okbank&pn=FixIt%20Services&am=1700.00&cu=INR&tn=Repair%20job%20BK-42"
        );
    }

    #[test]
    fn test_upi_link_requires_positive_amount() {
        assert!(upi_link(&payment_config(), Decimal::ZERO, "BK-42").is_err());
    }

    #[test]
    fn test_completion_code_is_numeric() {
        let code = generate_completion_code(4);
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_receipt_wire_shape() {
        let receipt = PaymentReceipt {
            amount: Decimal::from(300),
            method: PaymentMethod::Upi {
                transaction_ref: Some("UTR123".into()),
            },
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["method"], "upi");
        assert_eq!(value["transaction_ref"], "UTR123");
        let back: PaymentReceipt = serde_json::from_value(value).unwrap();
        assert_eq!(back, receipt);
    }
}
