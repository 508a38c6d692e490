//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ServiceDbError`] via `#[from]` (or an explicit `From` impl for boxed
//! storage errors).

use crate::domain_id::DomainId;
use crate::message::MessageType;

/// Top-level error shared by the domain, the application layer and adapters.
#[derive(Debug, thiserror::Error)]
pub enum ServiceDbError {
    /// A record failed its domain invariants.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A record looked up by identity does not exist.
    #[error("record not found")]
    NotFound(#[from] NotFoundError),

    /// The record store engine reported a failure.
    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),

    /// A query was handed to a record interface that does not serve it.
    #[error("query {query} is not supported by the {domain} interface")]
    UnsupportedQuery {
        /// Domain of the interface that received the query.
        domain: DomainId,
        /// Name of the query variant.
        query: &'static str,
    },

    /// An agent received a request for a message it did not register.
    #[error("{agent} does not serve {message}")]
    UnsupportedAgentRequest {
        agent: &'static str,
        message: MessageType,
    },

    /// No record interface is registered for the domain.
    #[error("no record interface registered for {0}")]
    InterfaceMissing(DomainId),

    /// A collaborator referenced without ownership has already been released.
    #[error("{0} is no longer available")]
    Released(&'static str),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("contact has neither a name nor a number")]
    EmptyContact,
    #[error("phone number must not be empty")]
    EmptyNumber,
    #[error("text must not be empty")]
    EmptyText,
    #[error("hour {0} is out of range")]
    InvalidHour(u8),
    #[error("minute {0} is out of range")]
    InvalidMinute(u8),
    #[error("record has no identity")]
    MissingIdentity,
    #[error("settings path must not be empty")]
    EmptyPath,
}

/// A record was not found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{record} {id} not found")]
pub struct NotFoundError {
    /// Kind of record (e.g. `"Contact"`).
    pub record: &'static str,
    /// Identity that was looked up, rendered as a string.
    pub id: String,
}
