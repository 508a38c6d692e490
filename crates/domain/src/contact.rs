//! Contact: a phone book entry with one or more numbers.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceDbError, ValidationError};
use crate::id::RecordId;

/// Kind of a contact's phone number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    #[default]
    Cell,
    Home,
    Work,
    Other,
}

impl NumberKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cell => "cell",
            Self::Home => "home",
            Self::Work => "work",
            Self::Other => "other",
        }
    }

    /// Parse the storage representation, falling back to [`NumberKind::Other`].
    #[must_use]
    pub fn from_storage(value: &str) -> Self {
        match value {
            "cell" => Self::Cell,
            "home" => Self::Home,
            "work" => Self::Work,
            _ => Self::Other,
        }
    }
}

/// A phone number attached to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumber {
    pub number: String,
    pub kind: NumberKind,
}

impl ContactNumber {
    #[must_use]
    pub fn new(number: impl Into<String>, kind: NumberKind) -> Self {
        Self {
            number: number.into(),
            kind,
        }
    }

    /// The number reduced to its digits, keeping a leading `+`.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize_number(&self.number)
    }
}

/// Reduce a dialled number to the form used for matching: digits only, with
/// a leading `+` preserved.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(trimmed.chars().filter(char::is_ascii_digit));
    out
}

/// Key under which messages from `raw` are threaded.
///
/// Dialled numbers use their normalised form. Alphanumeric senders ("MyBank")
/// have no digits to keep, so they are keyed on the trimmed sender itself.
#[must_use]
pub fn thread_address(raw: &str) -> String {
    let normalized = normalize_number(raw);
    if normalized.chars().any(|c| c.is_ascii_digit()) {
        normalized
    } else {
        raw.trim().to_owned()
    }
}

/// A phone book entry.
///
/// Temporary contacts are created for numbers that are not in the phone book
/// yet (e.g. an incoming message from an unknown sender); plain identity
/// lookups skip them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: RecordId,
    pub primary_name: String,
    pub alternative_name: String,
    pub numbers: Vec<ContactNumber>,
    pub speed_dial: String,
    pub mail: String,
    pub address: String,
    pub note: String,
    pub favourite: bool,
    pub blocked: bool,
    pub ice: bool,
    pub temporary: bool,
}

impl ContactRecord {
    /// Create a builder for constructing a [`ContactRecord`].
    #[must_use]
    pub fn builder() -> ContactRecordBuilder {
        ContactRecordBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceDbError::Validation`] when the contact has neither a
    /// name nor a number, or when one of its numbers is blank.
    pub fn validate(&self) -> Result<(), ServiceDbError> {
        if self.numbers.iter().any(|n| n.normalized().is_empty()) {
            return Err(ValidationError::EmptyNumber.into());
        }
        if self.primary_name.trim().is_empty()
            && self.alternative_name.trim().is_empty()
            && self.numbers.is_empty()
        {
            return Err(ValidationError::EmptyContact.into());
        }
        Ok(())
    }

    /// Name shown to the user: primary and alternative names joined, or the
    /// first number when the contact has no name.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.primary_name, self.alternative_name);
        let name = name.trim();
        if name.is_empty() {
            self.numbers
                .first()
                .map(|n| n.number.clone())
                .unwrap_or_default()
        } else {
            name.to_string()
        }
    }

    /// Whether any of the contact's numbers matches `number` once normalized.
    #[must_use]
    pub fn has_number(&self, number: &str) -> bool {
        let wanted = normalize_number(number);
        !wanted.is_empty() && self.numbers.iter().any(|n| n.normalized() == wanted)
    }
}

/// Step-by-step builder for [`ContactRecord`].
#[derive(Debug, Default)]
pub struct ContactRecordBuilder {
    record: ContactRecord,
}

impl ContactRecordBuilder {
    #[must_use]
    pub fn id(mut self, id: RecordId) -> Self {
        self.record.id = id;
        self
    }

    #[must_use]
    pub fn primary_name(mut self, name: impl Into<String>) -> Self {
        self.record.primary_name = name.into();
        self
    }

    #[must_use]
    pub fn alternative_name(mut self, name: impl Into<String>) -> Self {
        self.record.alternative_name = name.into();
        self
    }

    #[must_use]
    pub fn number(mut self, number: impl Into<String>, kind: NumberKind) -> Self {
        self.record.numbers.push(ContactNumber::new(number, kind));
        self
    }

    #[must_use]
    pub fn speed_dial(mut self, speed_dial: impl Into<String>) -> Self {
        self.record.speed_dial = speed_dial.into();
        self
    }

    #[must_use]
    pub fn mail(mut self, mail: impl Into<String>) -> Self {
        self.record.mail = mail.into();
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.record.address = address.into();
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.record.note = note.into();
        self
    }

    #[must_use]
    pub fn favourite(mut self, favourite: bool) -> Self {
        self.record.favourite = favourite;
        self
    }

    #[must_use]
    pub fn blocked(mut self, blocked: bool) -> Self {
        self.record.blocked = blocked;
        self
    }

    #[must_use]
    pub fn ice(mut self, ice: bool) -> Self {
        self.record.ice = ice;
        self
    }

    #[must_use]
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.record.temporary = temporary;
        self
    }

    /// Consume the builder, validate, and return a [`ContactRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceDbError::Validation`] if the contact is empty.
    pub fn build(self) -> Result<ContactRecord, ServiceDbError> {
        self.record.validate()?;
        Ok(self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_contact_with_name_only() {
        let contact = ContactRecord::builder().primary_name("Jan").build().unwrap();
        assert_eq!(contact.primary_name, "Jan");
        assert!(contact.id.is_none());
    }

    #[test]
    fn should_reject_contact_without_name_or_number() {
        let result = ContactRecord::builder().build();
        assert!(matches!(
            result,
            Err(ServiceDbError::Validation(ValidationError::EmptyContact))
        ));
    }

    #[test]
    fn should_reject_blank_number() {
        let result = ContactRecord::builder()
            .primary_name("Jan")
            .number("  -  ", NumberKind::Cell)
            .build();
        assert!(matches!(
            result,
            Err(ServiceDbError::Validation(ValidationError::EmptyNumber))
        ));
    }

    #[test]
    fn should_normalize_number_keeping_plus() {
        assert_eq!(normalize_number(" +48 600-100 200 "), "+48600100200");
        assert_eq!(normalize_number("(600) 100 200"), "600100200");
    }

    #[test]
    fn should_keep_alphanumeric_sender_as_thread_address() {
        assert_eq!(thread_address(" +48 600-100 200 "), "+48600100200");
        assert_eq!(thread_address(" Orange "), "Orange");
        assert_ne!(thread_address("Orange"), thread_address("MyBank"));
    }

    #[test]
    fn should_match_number_regardless_of_formatting() {
        let contact = ContactRecord::builder()
            .primary_name("Jan")
            .number("+48 600 100 200", NumberKind::Cell)
            .build()
            .unwrap();
        assert!(contact.has_number("+48600100200"));
        assert!(!contact.has_number("600100200"));
        assert!(!contact.has_number(""));
    }

    #[test]
    fn should_fall_back_to_number_for_display_name() {
        let contact = ContactRecord::builder()
            .number("600100200", NumberKind::Home)
            .build()
            .unwrap();
        assert_eq!(contact.display_name(), "600100200");

        let named = ContactRecord::builder()
            .primary_name("Jan")
            .alternative_name("Kowalski")
            .build()
            .unwrap();
        assert_eq!(named.display_name(), "Jan Kowalski");
    }

    #[test]
    fn should_parse_unknown_number_kind_as_other() {
        assert_eq!(NumberKind::from_storage("work"), NumberKind::Work);
        assert_eq!(NumberKind::from_storage("pager"), NumberKind::Other);
    }
}
