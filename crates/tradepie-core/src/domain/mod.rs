//! # Domain Models
//!
//! Canonical trading snapshot types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated instrument identifier |
//! | [`TradeRecord`] | One traded instrument inside a snapshot |
//! | [`Snapshot`] | Ordered batch of records produced by one fetch |
//!
//! All types validate on construction and on JSON decoding, so a `Snapshot`
//! read back from disk or the network upholds the same invariants as one built
//! in code.

mod record;
mod snapshot;
mod symbol;

pub use record::{validate_currency_code, TradeRecord};
pub use snapshot::Snapshot;
pub use symbol::Symbol;
