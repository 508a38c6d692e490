//! Request / response envelopes exchanged with the service.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentRequest, AgentResponse};
use crate::calllog::CalllogRecord;
use crate::contact::ContactRecord;
use crate::id::RecordId;
use crate::notification::OperationKind;
use crate::query::{Query, QueryResult};

/// Fieldless tag of every message the bus can carry to this service.
///
/// Responses echo the tag of the request they answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    DbContactAdd,
    DbContactGetById,
    DbContactGetBySpeedDial,
    DbContactMatchByNumber,
    DbContactRemove,
    DbContactUpdate,
    DbCalllogAdd,
    DbCalllogRemove,
    DbCalllogUpdate,
    DbQuery,
    DbServiceBackup,
    SettingsGet,
    SettingsSet,
    SettingsRemove,
    SettingsList,
    FileIndexerRegister,
    FileIndexerGet,
    FileIndexerRemove,
    FileIndexerListByMime,
    /// A tag owned by some other service.
    Foreign(u32),
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreign(tag) => write!(f, "Foreign({tag})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// An inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    ContactAdd(ContactRecord),
    ContactGetById {
        id: RecordId,
        /// Also resolve temporary contacts.
        with_temporary: bool,
    },
    ContactGetBySpeedDial(String),
    ContactMatchByNumber(String),
    ContactRemove(RecordId),
    ContactUpdate(ContactRecord),
    CalllogAdd(CalllogRecord),
    CalllogRemove(RecordId),
    CalllogUpdate(CalllogRecord),
    Query(Query),
    Backup {
        path: PathBuf,
    },
    Agent(AgentRequest),
    /// A message this service does not handle.
    Foreign {
        tag: u32,
    },
}

impl Request {
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::ContactAdd(_) => MessageType::DbContactAdd,
            Self::ContactGetById { .. } => MessageType::DbContactGetById,
            Self::ContactGetBySpeedDial(_) => MessageType::DbContactGetBySpeedDial,
            Self::ContactMatchByNumber(_) => MessageType::DbContactMatchByNumber,
            Self::ContactRemove(_) => MessageType::DbContactRemove,
            Self::ContactUpdate(_) => MessageType::DbContactUpdate,
            Self::CalllogAdd(_) => MessageType::DbCalllogAdd,
            Self::CalllogRemove(_) => MessageType::DbCalllogRemove,
            Self::CalllogUpdate(_) => MessageType::DbCalllogUpdate,
            Self::Query(_) => MessageType::DbQuery,
            Self::Backup { .. } => MessageType::DbServiceBackup,
            Self::Agent(request) => request.message_type(),
            Self::Foreign { tag } => MessageType::Foreign(*tag),
        }
    }
}

/// Data carried back with a [`Response`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    Empty,
    Contacts(Vec<ContactRecord>),
    Contact(Option<ContactRecord>),
    Calls(Vec<CalllogRecord>),
    /// Result of a [`Request::Query`], tagged with the name and kind of the
    /// query it answers.
    Query {
        query: String,
        kind: OperationKind,
        result: QueryResult,
    },
    Agent(AgentResponse),
}

/// Answer to exactly one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Tag of the request this answers.
    pub response_to: MessageType,
    pub success: bool,
    pub payload: Payload,
}

impl Response {
    #[must_use]
    pub fn new(response_to: MessageType, success: bool, payload: Payload) -> Self {
        Self {
            response_to,
            success,
            payload,
        }
    }

    /// A success/failure answer with no payload.
    #[must_use]
    pub fn flag(response_to: MessageType, success: bool) -> Self {
        Self::new(response_to, success, Payload::Empty)
    }

    /// Structurally empty acknowledgement, used for messages the service
    /// ignores.
    #[must_use]
    pub fn acknowledge(response_to: MessageType) -> Self {
        Self::flag(response_to, true)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.payload, Payload::Empty)
    }
}
