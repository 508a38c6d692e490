//! Call log: one entry per incoming, outgoing or missed call.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceDbError, ValidationError};
use crate::id::RecordId;
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    #[default]
    Incoming,
    Outgoing,
    Missed,
    Rejected,
}

impl CallType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::Missed => "missed",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the storage representation, falling back to [`CallType::Incoming`].
    #[must_use]
    pub fn from_storage(value: &str) -> Self {
        match value {
            "outgoing" => Self::Outgoing,
            "missed" => Self::Missed,
            "rejected" => Self::Rejected,
            _ => Self::Incoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalllogRecord {
    pub id: RecordId,
    pub number: String,
    pub contact_id: RecordId,
    /// Peer name resolved from the phone book on read; empty when unknown.
    pub name: String,
    pub kind: CallType,
    pub date: Timestamp,
    /// Call duration in seconds.
    pub duration: u32,
    pub read: bool,
}

impl CalllogRecord {
    #[must_use]
    pub fn new(number: impl Into<String>, kind: CallType) -> Self {
        Self {
            id: RecordId::NONE,
            number: number.into(),
            contact_id: RecordId::NONE,
            name: String::new(),
            kind,
            date: now(),
            duration: 0,
            read: !matches!(kind, CallType::Missed),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceDbError::Validation`] when the number is blank.
    pub fn validate(&self) -> Result<(), ServiceDbError> {
        if self.number.trim().is_empty() {
            return Err(ValidationError::EmptyNumber.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_leave_missed_calls_unread() {
        assert!(!CalllogRecord::new("600100200", CallType::Missed).read);
        assert!(CalllogRecord::new("600100200", CallType::Outgoing).read);
    }

    #[test]
    fn should_reject_call_without_number() {
        assert!(CalllogRecord::new("", CallType::Incoming).validate().is_err());
    }
}
