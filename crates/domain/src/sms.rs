//! SMS: messages, the conversation threads grouping them, and templates.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceDbError, ValidationError};
use crate::id::RecordId;
use crate::time::{Timestamp, now};

/// Direction / delivery state of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsType {
    #[default]
    Inbox,
    Outbox,
    Draft,
    Queued,
    Failed,
}

impl SmsType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Outbox => "outbox",
            Self::Draft => "draft",
            Self::Queued => "queued",
            Self::Failed => "failed",
        }
    }

    /// Parse the storage representation, falling back to [`SmsType::Inbox`].
    #[must_use]
    pub fn from_storage(value: &str) -> Self {
        match value {
            "outbox" => Self::Outbox,
            "draft" => Self::Draft,
            "queued" => Self::Queued,
            "failed" => Self::Failed,
            _ => Self::Inbox,
        }
    }
}

/// A single text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecord {
    pub id: RecordId,
    /// Owning thread; assigned by the store when the message is added.
    pub thread_id: RecordId,
    /// Phone book entry of the peer, when known.
    pub contact_id: RecordId,
    pub number: String,
    pub body: String,
    pub kind: SmsType,
    pub date: Timestamp,
    pub read: bool,
}

impl SmsRecord {
    /// A new, not yet stored message to or from `number`.
    #[must_use]
    pub fn new(number: impl Into<String>, body: impl Into<String>, kind: SmsType) -> Self {
        Self {
            id: RecordId::NONE,
            thread_id: RecordId::NONE,
            contact_id: RecordId::NONE,
            number: number.into(),
            body: body.into(),
            kind,
            date: now(),
            read: !matches!(kind, SmsType::Inbox),
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

/// A conversation with one peer number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: RecordId,
    pub number: String,
    pub contact_id: RecordId,
    /// Body of the most recent message.
    pub snippet: String,
    pub date: Timestamp,
    pub msg_count: u32,
    pub unread_count: u32,
    pub last_kind: SmsType,
    /// Peer name resolved from the phone book on read; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A canned reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTemplateRecord {
    pub id: RecordId,
    pub text: String,
    pub last_usage: Timestamp,
    /// Position in the template list.
    pub order: u32,
}

impl SmsTemplateRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, order: u32) -> Self {
        Self {
            id: RecordId::NONE,
            text: text.into(),
            last_usage: now(),
            order,
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceDbError::Validation`] when the text is blank.
    pub fn validate(&self) -> Result<(), ServiceDbError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_mark_outgoing_message_as_read() {
        let sms = SmsRecord::new("600100200", "hi", SmsType::Outbox);
        assert!(sms.read);
        let incoming = SmsRecord::new("600100200", "hi", SmsType::Inbox);
        assert!(!incoming.read);
    }

    #[test]
    fn should_reject_message_without_number() {
        let sms = SmsRecord::new(" ", "hi", SmsType::Outbox);
        assert!(matches!(
            sms.validate(),
            Err(ServiceDbError::Validation(ValidationError::EmptyNumber))
        ));
    }

    #[test]
    fn should_reject_blank_template() {
        let template = SmsTemplateRecord::new("   ", 0);
        assert!(template.validate().is_err());
        assert!(SmsTemplateRecord::new("On my way", 1).validate().is_ok());
    }

    #[test]
    fn should_roundtrip_sms_type_through_storage() {
        for kind in [
            SmsType::Inbox,
            SmsType::Outbox,
            SmsType::Draft,
            SmsType::Queued,
            SmsType::Failed,
        ] {
            assert_eq!(SmsType::from_storage(kind.as_str()), kind);
        }
    }
}
