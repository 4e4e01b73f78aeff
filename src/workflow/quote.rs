use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ValidationError;

/// Technician cost breakdown shared with the customer for approval.
///
/// `total_amount` is always `labor_cost + parts_cost`; the only ways to get a
/// `Quote` are [`build_quote`] and deserialisation, and both recompute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    labor_cost: Decimal,
    parts_cost: Decimal,
    total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Quote {
    pub fn labor_cost(&self) -> Decimal {
        self.labor_cost
    }

    pub fn parts_cost(&self) -> Decimal {
        self.parts_cost
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Build a quote, rejecting negative costs. Blank notes are dropped.
pub fn build_quote(
    labor_cost: Decimal,
    parts_cost: Decimal,
    notes: Option<String>,
) -> Result<Quote, ValidationError> {
    if labor_cost < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field: "labor_cost",
            value: labor_cost,
        });
    }
    if parts_cost < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field: "parts_cost",
            value: parts_cost,
        });
    }

    let total_amount = labor_cost
        .checked_add(parts_cost)
        .ok_or(ValidationError::AmountOutOfRange {
            field: "total_amount",
        })?;

    Ok(Quote {
        labor_cost,
        parts_cost,
        total_amount,
        notes: notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

#[derive(Deserialize)]
struct QuoteFields {
    labor_cost: Decimal,
    parts_cost: Decimal,
    #[serde(default)]
    total_amount: Option<Decimal>,
    #[serde(default)]
    notes: Option<String>,
}

impl<'de> Deserialize<'de> for Quote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let fields = QuoteFields::deserialize(deserializer)?;
        let quote =
            build_quote(fields.labor_cost, fields.parts_cost, fields.notes).map_err(D::Error::custom)?;
        match fields.total_amount {
            Some(stated) if stated != quote.total_amount => Err(D::Error::custom(format!(
                "quote total {stated} does not equal labor + parts ({})",
                quote.total_amount
            ))),
            _ => Ok(quote),
        }
    }
}
