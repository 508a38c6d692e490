//! `SQLite` store engine: opens one database per store and wires the record
//! interfaces and agents over them.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use servicedb_app::ports::{ContactLookup, DatabaseAgent, StoreEngine, StoreSet};
use servicedb_app::registry::{InterfaceRegistry, RegistryError};
use servicedb_domain::domain_id::StoreKind;
use servicedb_domain::error::ServiceDbError;

use crate::alarms::SqliteAlarms;
use crate::calllog::SqliteCalllog;
use crate::contacts::SqliteContacts;
use crate::country_codes::SqliteCountryCodes;
use crate::error::StorageError;
use crate::file_indexer_agent::FileIndexerAgent;
use crate::notes::SqliteNotes;
use crate::notifications::SqliteNotifications;
use crate::quotes::SqliteQuotes;
use crate::settings_agent::SettingsAgent;
use crate::sms::SqliteSms;
use crate::sms_templates::SqliteSmsTemplates;
use crate::store::SqliteStore;
use crate::threads::SqliteThreads;

/// Where the engine keeps its files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory of every writable store and agent database.
    pub user_dir: PathBuf,
    /// Directory of read-only asset databases (country codes).
    pub assets_dir: PathBuf,
    /// Connections per store pool.
    pub max_connections: u32,
}

pub struct SqliteEngine {
    config: EngineConfig,
}

impl SqliteEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Fixed path of the store of `kind`.
    #[must_use]
    pub fn store_path(&self, kind: StoreKind) -> PathBuf {
        let dir = if kind.is_asset() {
            &self.config.assets_dir
        } else {
            &self.config.user_dir
        };
        dir.join(kind.file_name())
    }
}

#[async_trait]
impl StoreEngine for SqliteEngine {
    type Store = SqliteStore;

    #[tracing::instrument(skip(self), fields(user_dir = %self.config.user_dir.display()))]
    async fn initialize(&self) -> Result<(), ServiceDbError> {
        tokio::fs::create_dir_all(&self.config.user_dir)
            .await
            .map_err(StorageError::from)?;
        tokio::fs::create_dir_all(&self.config.assets_dir)
            .await
            .map_err(StorageError::from)?;
        tracing::info!("store engine initialized");
        Ok(())
    }

    async fn open(&self, kind: StoreKind) -> Result<SqliteStore, ServiceDbError> {
        let path = self.store_path(kind);
        let store = SqliteStore::open(kind, path, self.config.max_connections).await?;
        tracing::debug!(store = %kind, "store opened");
        Ok(store)
    }

    fn build_interfaces(
        &self,
        stores: &StoreSet<SqliteStore>,
    ) -> Result<InterfaceRegistry, RegistryError> {
        let contacts_pool = stores.contacts.pool();
        let contacts = Arc::new(SqliteContacts::new(contacts_pool.clone()));
        let lookup: Weak<dyn ContactLookup> = Arc::downgrade(&contacts) as Weak<dyn ContactLookup>;
        let sms_pool = stores.sms.pool();

        InterfaceRegistry::builder()
            .contacts(contacts)
            .calllog(Arc::new(SqliteCalllog::new(
                stores.calllog.pool().clone(),
                contacts_pool.clone(),
            )))
            .register(Arc::new(SqliteSms::new(
                sms_pool.clone(),
                contacts_pool.clone(),
            )))
            .register(Arc::new(SqliteThreads::new(
                sms_pool.clone(),
                contacts_pool.clone(),
            )))
            .register(Arc::new(SqliteSmsTemplates::new(sms_pool.clone())))
            .register(Arc::new(SqliteAlarms::new(stores.alarms.pool().clone())))
            .register(Arc::new(SqliteNotes::new(stores.notes.pool().clone())))
            .register(Arc::new(SqliteCountryCodes::new(
                stores.country_codes.pool().clone(),
            )))
            .register(Arc::new(SqliteNotifications::new(
                stores.notifications.pool().clone(),
                lookup,
            )))
            .register(Arc::new(SqliteQuotes::new(stores.quotes.pool().clone())))
            .build()
    }

    fn create_agents(&self) -> Vec<Box<dyn DatabaseAgent>> {
        let EngineConfig {
            user_dir,
            max_connections,
            ..
        } = &self.config;
        vec![
            Box::new(SettingsAgent::new(user_dir, *max_connections)),
            Box::new(FileIndexerAgent::new(user_dir, *max_connections)),
        ]
    }

    async fn deinitialize(&self) {
        tracing::info!("store engine deinitialized");
    }
}
