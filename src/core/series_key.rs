// Identity of one derived or input series

use serde::{Deserialize, Serialize};
use std::fmt;

/// A series is addressed by its label (meter location, tenant, ...) and the
/// register code it was read from or derived into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub label: String,
    pub code: String,
}

impl SeriesKey {
    pub fn new(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.label, self.code)
    }
}
