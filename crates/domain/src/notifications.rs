//! Notification counters: unread calls / messages shown by the UI.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKey {
    Calls,
    Sms,
}

impl NotificationKey {
    pub const ALL: [Self; 2] = [Self::Calls, Self::Sms];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::Sms => "sms",
        }
    }

    #[must_use]
    pub fn from_storage(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: RecordId,
    pub key: NotificationKey,
    pub value: u32,
    /// Contact of the most recent event counted, when it was a known one.
    pub contact_id: RecordId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_known_keys_only() {
        assert_eq!(NotificationKey::from_storage("sms"), Some(NotificationKey::Sms));
        assert_eq!(NotificationKey::from_storage("email"), None);
    }
}
