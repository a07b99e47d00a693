use serde::{Deserialize, Serialize};

use crate::TradeRecord;

/// Ordered batch of trade records produced atomically by one fetch.
///
/// Order is the endpoint's order and is kept for rendering; it carries no
/// ranking. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<TradeRecord>);

impl Snapshot {
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradeRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signed maximum of `change_pct`; `None` for an empty snapshot.
    pub fn max_change_pct(&self) -> Option<f64> {
        self.0
            .iter()
            .map(|record| record.change_pct)
            .fold(None, |max, value| match max {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
    }

    pub fn total_price(&self) -> f64 {
        self.0.iter().map(|record| record.price).sum()
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.0
    }
}

impl From<Vec<TradeRecord>> for Snapshot {
    fn from(records: Vec<TradeRecord>) -> Self {
        Self(records)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a TradeRecord;
    type IntoIter = std::slice::Iter<'a, TradeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
