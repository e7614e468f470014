//! Order identifier token.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A human-facing order id of the form `DH<n>`.
///
/// Ids sort by their numeric suffix, not lexically, so `DH10` comes after
/// `DH9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    const PREFIX: &'static str = "DH";

    /// Build the id for sequence number `n`.
    #[must_use]
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{}{n}", Self::PREFIX))
    }

    /// The numeric suffix, if this id is well-formed.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
