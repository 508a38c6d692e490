//! Record interface ports: the capability sets a domain exposes.
//!
//! Every domain implements [`RecordInterface`] (the generic query path).
//! Domains reached through dedicated messages additionally implement
//! [`RecordCrud`] and their optional lookup traits; the dispatcher sees them
//! through the combined [`ContactInterface`] / [`CalllogInterface`] sets.

use async_trait::async_trait;

use servicedb_domain::calllog::CalllogRecord;
use servicedb_domain::contact::ContactRecord;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{Query, QueryResult};

/// Capability shared by every domain: execute a generic [`Query`].
#[async_trait]
pub trait RecordInterface: Send + Sync {
    /// Domain this interface serves.
    fn domain(&self) -> DomainId;

    /// Execute `query`, consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceDbError::UnsupportedQuery`] for queries aimed at
    /// another domain or not served by this one, or a storage error.
    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError>;
}

/// Identity-based CRUD over records of type `R`.
#[async_trait]
pub trait RecordCrud<R>: Send + Sync
where
    R: Send + Sync + 'static,
{
    /// Store a new record and return the identity assigned to it. The
    /// record's own `id` is ignored.
    async fn add(&self, record: &R) -> Result<RecordId, ServiceDbError>;

    /// Overwrite the stored record with the same identity. Returns `false`
    /// when no such record exists.
    async fn update(&self, record: &R) -> Result<bool, ServiceDbError>;

    /// Remove a record. Returns `false` when nothing was removed.
    async fn remove_by_id(&self, id: RecordId) -> Result<bool, ServiceDbError>;

    async fn get_by_id(&self, id: RecordId) -> Result<Option<R>, ServiceDbError>;
}

/// Contact-only lookups.
#[async_trait]
pub trait ContactLookup: Send + Sync {
    /// Like [`RecordCrud::get_by_id`] but also resolves temporary contacts.
    async fn get_by_id_with_temporary(
        &self,
        id: RecordId,
    ) -> Result<Option<ContactRecord>, ServiceDbError>;

    async fn get_by_speed_dial(&self, speed_dial: &str)
    -> Result<Vec<ContactRecord>, ServiceDbError>;

    /// Find the contact owning `number`, compared digits-only.
    async fn match_by_number(&self, number: &str) -> Result<Option<ContactRecord>, ServiceDbError>;
}

/// Identity of the most recently added record.
#[async_trait]
pub trait LastIdLookup: Send + Sync {
    async fn get_last_id(&self) -> Result<RecordId, ServiceDbError>;
}

/// Everything the dispatcher needs from the contacts domain.
pub trait ContactInterface: RecordInterface + RecordCrud<ContactRecord> + ContactLookup {}

impl<T> ContactInterface for T where T: RecordInterface + RecordCrud<ContactRecord> + ContactLookup {}

/// Everything the dispatcher needs from the call log domain.
pub trait CalllogInterface: RecordInterface + RecordCrud<CalllogRecord> + LastIdLookup {}

impl<T> CalllogInterface for T where T: RecordInterface + RecordCrud<CalllogRecord> + LastIdLookup {}
