//! Store engine port: the shared engine every record store is opened from.

use async_trait::async_trait;

use servicedb_domain::domain_id::StoreKind;
use servicedb_domain::error::ServiceDbError;

use crate::ports::{DatabaseAgent, RecordStore};
use crate::registry::{InterfaceRegistry, RegistryError};

/// The engine handle created once by the lifecycle controller.
///
/// It opens stores, wires record interfaces over them (including
/// cross-domain references such as SMS → contacts) and constructs agents.
#[async_trait]
pub trait StoreEngine: Send + Sync {
    type Store: RecordStore + 'static;

    /// # Errors
    ///
    /// Returns a storage error when the engine cannot start; the service
    /// cannot run without it.
    async fn initialize(&self) -> Result<(), ServiceDbError>;

    /// Open the store of `kind` at its fixed path.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the store file cannot be opened.
    async fn open(&self, kind: StoreKind) -> Result<Self::Store, ServiceDbError>;

    /// Build one record interface per domain over the opened stores.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the resulting registry is incomplete.
    fn build_interfaces(
        &self,
        stores: &StoreSet<Self::Store>,
    ) -> Result<InterfaceRegistry, RegistryError>;

    /// Construct (but do not initialise) every agent.
    fn create_agents(&self) -> Vec<Box<dyn DatabaseAgent>>;

    async fn deinitialize(&self);
}

/// Every opened store, one field per [`StoreKind`].
#[derive(Debug)]
pub struct StoreSet<S> {
    pub contacts: S,
    pub sms: S,
    pub alarms: S,
    pub notes: S,
    pub calllog: S,
    pub country_codes: S,
    pub notifications: S,
    pub quotes: S,
}

impl<S> StoreSet<S> {
    /// Assemble a set from stores listed in [`StoreKind::OPEN_ORDER`].
    #[must_use]
    pub fn from_open_order(stores: [S; 8]) -> Self {
        let [
            contacts,
            sms,
            alarms,
            notes,
            calllog,
            country_codes,
            notifications,
            quotes,
        ] = stores;
        Self {
            contacts,
            sms,
            alarms,
            notes,
            calllog,
            country_codes,
            notifications,
            quotes,
        }
    }

    #[must_use]
    pub fn get(&self, kind: StoreKind) -> &S {
        match kind {
            StoreKind::Contacts => &self.contacts,
            StoreKind::Sms => &self.sms,
            StoreKind::Alarms => &self.alarms,
            StoreKind::Notes => &self.notes,
            StoreKind::Calllog => &self.calllog,
            StoreKind::CountryCodes => &self.country_codes,
            StoreKind::Notifications => &self.notifications,
            StoreKind::Quotes => &self.quotes,
        }
    }

    /// Stores in [`StoreKind::OPEN_ORDER`].
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        StoreKind::OPEN_ORDER.into_iter().map(|kind| self.get(kind))
    }

    /// Stores in [`StoreKind::BACKUP_ORDER`].
    pub fn in_backup_order(&self) -> impl Iterator<Item = &S> {
        StoreKind::BACKUP_ORDER.into_iter().map(|kind| self.get(kind))
    }
}
