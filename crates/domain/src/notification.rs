//! Change notifications broadcast after mutations and generic queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain_id::DomainId;

/// Kind of operation a message or query performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the operation changes store contents.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Read)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Something happened in `domain`". Carries no payload; subscribers that
/// need data re-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub domain: DomainId,
    pub kind: OperationKind,
}

impl NotificationEvent {
    #[must_use]
    pub const fn new(domain: DomainId, kind: OperationKind) -> Self {
        Self { domain, kind }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.kind)
    }
}
