//! Backup coordinator: snapshots every backed-up store, then the settings
//! agent, flat into one directory.

use std::path::{Path, PathBuf};

use servicedb_domain::domain_id::StoreKind;
use servicedb_domain::error::ServiceDbError;

use crate::agents::AgentSet;
use crate::ports::{RecordStore, StoreSet};

/// Name of the only agent included in backups.
pub const SETTINGS_AGENT_NAME: &str = "settingsAgent";

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
    #[error("failed to snapshot the {kind} store")]
    Store {
        kind: StoreKind,
        #[source]
        source: ServiceDbError,
    },
    #[error("failed to snapshot agent {name}")]
    Agent {
        name: &'static str,
        #[source]
        source: ServiceDbError,
    },
}

/// `dir/<file name of original>`; the directory part of `original` is
/// dropped.
///
/// # Errors
///
/// Returns [`BackupError::NoFileName`] when `original` ends in `..` or is
/// empty.
pub fn backup_target(dir: &Path, original: &Path) -> Result<PathBuf, BackupError> {
    original
        .file_name()
        .map(|name| dir.join(name))
        .ok_or_else(|| BackupError::NoFileName(original.to_path_buf()))
}

/// Sequential, fail-fast backup.
///
/// Snapshots already written when a later one fails stay on disk.
#[derive(Debug, Clone, Copy)]
pub struct BackupCoordinator {
    agent_name: &'static str,
}

impl Default for BackupCoordinator {
    fn default() -> Self {
        Self {
            agent_name: SETTINGS_AGENT_NAME,
        }
    }
}

impl BackupCoordinator {
    /// Coordinator backing up the agent called `agent_name` after the stores.
    #[must_use]
    pub fn with_agent(agent_name: &'static str) -> Self {
        Self { agent_name }
    }

    /// Snapshot stores in [`StoreKind::BACKUP_ORDER`], then the agent.
    ///
    /// # Errors
    ///
    /// Returns the first snapshot failure; nothing after it is attempted.
    #[tracing::instrument(skip(self, stores, agents))]
    pub async fn backup<S: RecordStore>(
        &self,
        stores: &StoreSet<S>,
        agents: &AgentSet,
        target_dir: &Path,
    ) -> Result<(), BackupError> {
        for store in stores.in_backup_order() {
            let kind = store.kind();
            let target = backup_target(target_dir, store.file_path())?;
            store
                .store_into_file(&target)
                .await
                .map_err(|source| BackupError::Store { kind, source })?;
            tracing::debug!(%kind, target = %target.display(), "store snapshot written");
        }

        let Some(agent) = agents.find(self.agent_name) else {
            tracing::warn!(agent = self.agent_name, "agent not registered, skipping");
            return Ok(());
        };
        let target = backup_target(target_dir, agent.db_file_path())?;
        agent
            .store_into_file(&target)
            .await
            .map_err(|source| BackupError::Agent {
                name: self.agent_name,
                source,
            })?;
        tracing::info!(target_dir = %target_dir.display(), "backup complete");
        Ok(())
    }
}
