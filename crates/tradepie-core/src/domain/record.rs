use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// One traded instrument inside a [`Snapshot`](crate::Snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TradeRecordPayload")]
pub struct TradeRecord {
    pub symbol: Symbol,
    pub price: f64,
    pub currency: String,
    /// Signed percentage change since the endpoint's reference point.
    pub change_pct: f64,
}

impl TradeRecord {
    pub fn new(
        symbol: Symbol,
        price: f64,
        currency: impl AsRef<str>,
        change_pct: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        if !change_pct.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "change_pct",
            });
        }

        Ok(Self {
            symbol,
            price,
            currency: validate_currency_code(currency.as_ref())?,
            change_pct,
        })
    }

    /// Tooltip text shown for this record's pie slice.
    pub fn price_label(&self) -> String {
        format!("{} {}", self.price, self.currency)
    }
}

/// Wire shape accepted from the endpoint and the persisted cache.
#[derive(Debug, Deserialize)]
struct TradeRecordPayload {
    symbol: String,
    price: f64,
    currency: String,
    change_pct: f64,
}

impl TryFrom<TradeRecordPayload> for TradeRecord {
    type Error = ValidationError;

    fn try_from(payload: TradeRecordPayload) -> Result<Self, Self::Error> {
        Self::new(
            Symbol::parse(&payload.symbol)?,
            payload.price,
            payload.currency,
            payload.change_pct,
        )
    }
}

/// Reject a blank currency code. Anything else is kept exactly as sent.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(input.to_owned())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
