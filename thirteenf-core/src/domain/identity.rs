use serde::{Deserialize, Serialize};
use std::fmt;

/// A reporting institution: manager number plus manager name.
///
/// Manager numbers are reused across unrelated institutions over the decades,
/// so the number alone is not an identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManagerId {
    pub number: i64,
    pub name: String,
}

impl ManagerId {
    pub fn new(number: i64, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
        }
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, self.name)
    }
}
