//! Database agent port: pluggable, non-CRUD units with their own storage.

use std::path::Path;

use async_trait::async_trait;

use servicedb_domain::agent::{AgentRequest, AgentResponse};
use servicedb_domain::error::ServiceDbError;

use crate::agents::MessageRegistrar;

/// A unit owning its own store and message set (settings, file index, …).
///
/// The lifecycle controller calls, in order:
///
/// 1. [`init_db`](Self::init_db): open and prepare the backing store
/// 2. [`register_messages`](Self::register_messages): claim message tags
/// 3. (requests for claimed tags are forwarded to [`handle`](Self::handle))
/// 4. [`close`](Self::close): on shutdown
///
/// Agents are not part of the interface registry and never receive generic
/// queries.
#[async_trait]
pub trait DatabaseAgent: Send + Sync {
    /// Stable name, used to pick the agent included in backups.
    fn agent_name(&self) -> &'static str;

    fn db_file_path(&self) -> &Path;

    /// # Errors
    ///
    /// Returns a storage error when the backing store cannot be opened.
    async fn init_db(&mut self) -> Result<(), ServiceDbError>;

    /// Claim the message tags this agent serves.
    fn register_messages(&self, registrar: &mut MessageRegistrar<'_>);

    /// # Errors
    ///
    /// Returns a validation or storage error.
    async fn handle(&self, request: AgentRequest) -> Result<AgentResponse, ServiceDbError>;

    /// # Errors
    ///
    /// Returns a storage error when the snapshot cannot be written.
    async fn store_into_file(&self, target: &Path) -> Result<(), ServiceDbError>;

    async fn close(&self);
}
