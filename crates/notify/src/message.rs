//! Channel message identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the chat provider assigns to a sent message.
///
/// Telegram hands out integers; the relay only ever stores and echoes the
/// value back, so it is kept in its decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form, when the identifier is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids() {
        let id = MessageId::from(4217_i64);
        assert_eq!(id.as_str(), "4217");
        assert_eq!(id.as_i64(), Some(4217));
        assert_eq!(MessageId::new("abc").as_i64(), None);
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&MessageId::new("77")).unwrap();
        assert_eq!(json, "\"77\"");
    }
}
