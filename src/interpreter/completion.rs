//! Completion candidates

use serde::{Deserialize, Serialize};

/// A single completion candidate
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterpreterCompletion {
    /// Label shown in the dropdown
    pub name: String,
    /// Text inserted on selection
    pub value: String,
    /// Short kind hint, e.g. "command" or "keyword"
    #[serde(default)]
    pub meta: String,
}

impl InterpreterCompletion {
    pub fn new(name: impl Into<String>, value: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            meta: meta.into(),
        }
    }
}
