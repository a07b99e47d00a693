use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Instrument identifier as reported by the trading endpoint.
///
/// Any non-blank text is accepted (index tickers like `^GSPC`, share classes
/// like `BRK B`). Surrounding whitespace is dropped and case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_preserves_case() {
        let parsed = Symbol::parse(" btc-usd ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "btc-usd");
    }

    #[test]
    fn rejects_empty_symbol() {
        let err = Symbol::parse("   ").expect_err("must fail");
        assert_eq!(err, ValidationError::EmptySymbol);
    }

    #[test]
    fn accepts_index_and_share_class_tickers() {
        for raw in ["^GSPC", "BRK B", "7203.T", "DAX®"] {
            let parsed = Symbol::parse(raw).expect("symbol should parse");
            assert_eq!(parsed.as_str(), raw);
        }
    }

    #[test]
    fn parses_through_from_str() {
        let parsed: Symbol = "ETH/USD".parse().expect("symbol should parse");
        assert_eq!(parsed.to_string(), "ETH/USD");
    }

    #[test]
    fn deserializes_caret_prefixed_symbol() {
        let parsed: Symbol = serde_json::from_str(r#"" ^GSPC""#).expect("symbol should decode");
        assert_eq!(parsed.as_str(), "^GSPC");
    }
}
