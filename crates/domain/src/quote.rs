//! Quote: a text and its author, shown on the idle screen.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceDbError, ValidationError};
use crate::id::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: RecordId,
    pub text: String,
    pub author: String,
    pub enabled: bool,
}

impl QuoteRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: RecordId::NONE,
            text: text.into(),
            author: author.into(),
            enabled: true,
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
