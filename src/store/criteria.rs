//! Partial-match search criteria.
//!
//! A record matches when **any** criterion with a value is satisfied, where
//! satisfied means the record's field is a string that contains the value
//! (case-sensitive substring). Criteria without a value are ignored; if none
//! carry a value, every record matches.

use serde_json::{Map, Value};

/// Field name → optional search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    fields: Vec<(String, Option<String>)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion. `None` leaves the field unconstrained.
    pub fn field(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.fields.push((name.into(), value.map(Into::into)));
        self
    }

    /// True when no criterion carries a value.
    pub fn is_unconstrained(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_none())
    }

    /// Evaluate against a stored record.
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        if self.is_unconstrained() {
            return true;
        }

        self.fields.iter().any(|(name, term)| match (term, record.get(name)) {
            (Some(term), Some(Value::String(value))) => value.contains(term.as_str()),
            _ => false,
        })
    }
}
