//! Note: free text with an edit date.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: RecordId,
    pub text: String,
    pub date: Timestamp,
}

impl NoteRecord {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: RecordId::NONE,
            text: text.into(),
            date: now(),
        }
    }
}
