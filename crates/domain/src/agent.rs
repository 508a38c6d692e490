//! Requests served by database agents rather than record interfaces.

use serde::{Deserialize, Serialize};

use crate::message::MessageType;

/// One persisted setting, addressed by a slash-separated path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsEntry {
    pub path: String,
    pub value: String,
}

/// Metadata the file indexer keeps for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexEntry {
    pub path: String,
    pub size: u64,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingsRequest {
    Get { path: String },
    Set { path: String, value: String },
    Remove { path: String },
    /// Every entry whose path starts with `prefix`.
    List { prefix: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileIndexerRequest {
    Register(FileIndexEntry),
    Get { path: String },
    Remove { path: String },
    ListByMime { mime: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentRequest {
    Settings(SettingsRequest),
    FileIndexer(FileIndexerRequest),
}

impl AgentRequest {
    /// Message tag agents register for.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Settings(SettingsRequest::Get { .. }) => MessageType::SettingsGet,
            Self::Settings(SettingsRequest::Set { .. }) => MessageType::SettingsSet,
            Self::Settings(SettingsRequest::Remove { .. }) => MessageType::SettingsRemove,
            Self::Settings(SettingsRequest::List { .. }) => MessageType::SettingsList,
            Self::FileIndexer(FileIndexerRequest::Register(_)) => MessageType::FileIndexerRegister,
            Self::FileIndexer(FileIndexerRequest::Get { .. }) => MessageType::FileIndexerGet,
            Self::FileIndexer(FileIndexerRequest::Remove { .. }) => MessageType::FileIndexerRemove,
            Self::FileIndexer(FileIndexerRequest::ListByMime { .. }) => {
                MessageType::FileIndexerListByMime
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentResponse {
    Value(Option<String>),
    Settings(Vec<SettingsEntry>),
    File(Option<FileIndexEntry>),
    Files(Vec<FileIndexEntry>),
    Done(bool),
}
