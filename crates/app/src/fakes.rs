//! In-memory implementations of the ports, for unit tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use servicedb_domain::agent::{AgentRequest, AgentResponse};
use servicedb_domain::calllog::CalllogRecord;
use servicedb_domain::contact::ContactRecord;
use servicedb_domain::domain_id::{DomainId, StoreKind};
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::message::MessageType;
use servicedb_domain::query::{ContactQuery, Query, QueryResult};

use crate::agents::MessageRegistrar;
use crate::ports::{
    ContactLookup, DatabaseAgent, LastIdLookup, RecordCrud, RecordInterface, RecordStore,
    StoreEngine, StoreSet,
};
use crate::registry::{InterfaceRegistry, RegistryError};

fn failure(what: &str) -> ServiceDbError {
    ServiceDbError::Storage(format!("{what} failed").into())
}

/// Ordered log of lifecycle side effects shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Identity-keyed table that never reuses identities.
struct Table<R> {
    rows: Mutex<BTreeMap<RecordId, R>>,
    next_id: AtomicU32,
}

impl<R: Clone> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
        }
    }
}

impl<R: Clone> Table<R> {
    fn insert(&self, record: R, set_id: impl FnOnce(&mut R, RecordId)) -> RecordId {
        let id = RecordId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut record = record;
        set_id(&mut record, id);
        self.rows.lock().unwrap().insert(id, record);
        id
    }

    fn replace(&self, id: RecordId, record: R) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: RecordId) -> bool {
        self.rows.lock().unwrap().remove(&id).is_some()
    }

    fn get(&self, id: RecordId) -> Option<R> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    fn all(&self) -> Vec<R> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn last_id(&self) -> RecordId {
        self.rows
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(RecordId::NONE)
    }
}

#[derive(Default)]
pub struct InMemoryContacts {
    table: Table<ContactRecord>,
}

impl InMemoryContacts {
    pub fn len(&self) -> usize {
        self.table.len()
    }
}

#[async_trait]
impl RecordInterface for InMemoryContacts {
    fn domain(&self) -> DomainId {
        DomainId::Contact
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        match query {
            Query::Contact(ContactQuery::Count) => {
                Ok(QueryResult::Count(u32::try_from(self.table.len()).unwrap()))
            }
            Query::Contact(ContactQuery::List(_)) => Ok(QueryResult::Contacts(self.table.all())),
            other => Err(ServiceDbError::UnsupportedQuery {
                domain: DomainId::Contact,
                query: other.name(),
            }),
        }
    }
}

#[async_trait]
impl RecordCrud<ContactRecord> for InMemoryContacts {
    async fn add(&self, record: &ContactRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        Ok(self.table.insert(record.clone(), |r, id| r.id = id))
    }

    async fn update(&self, record: &ContactRecord) -> Result<bool, ServiceDbError> {
        Ok(self.table.replace(record.id, record.clone()))
    }

    async fn remove_by_id(&self, id: RecordId) -> Result<bool, ServiceDbError> {
        Ok(self.table.remove(id))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<ContactRecord>, ServiceDbError> {
        Ok(self.table.get(id).filter(|c| !c.temporary))
    }
}

#[async_trait]
impl ContactLookup for InMemoryContacts {
    async fn get_by_id_with_temporary(
        &self,
        id: RecordId,
    ) -> Result<Option<ContactRecord>, ServiceDbError> {
        Ok(self.table.get(id))
    }

    async fn get_by_speed_dial(
        &self,
        speed_dial: &str,
    ) -> Result<Vec<ContactRecord>, ServiceDbError> {
        Ok(self
            .table
            .all()
            .into_iter()
            .filter(|c| c.speed_dial == speed_dial)
            .collect())
    }

    async fn match_by_number(&self, number: &str) -> Result<Option<ContactRecord>, ServiceDbError> {
        Ok(self.table.all().into_iter().find(|c| c.has_number(number)))
    }
}

#[derive(Default)]
pub struct InMemoryCalllog {
    table: Table<CalllogRecord>,
}

impl InMemoryCalllog {
    pub fn len(&self) -> usize {
        self.table.len()
    }
}

#[async_trait]
impl RecordInterface for InMemoryCalllog {
    fn domain(&self) -> DomainId {
        DomainId::Calllog
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        Err(ServiceDbError::UnsupportedQuery {
            domain: DomainId::Calllog,
            query: query.name(),
        })
    }
}

#[async_trait]
impl RecordCrud<CalllogRecord> for InMemoryCalllog {
    async fn add(&self, record: &CalllogRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        Ok(self.table.insert(record.clone(), |r, id| r.id = id))
    }

    async fn update(&self, record: &CalllogRecord) -> Result<bool, ServiceDbError> {
        Ok(self.table.replace(record.id, record.clone()))
    }

    async fn remove_by_id(&self, id: RecordId) -> Result<bool, ServiceDbError> {
        Ok(self.table.remove(id))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<CalllogRecord>, ServiceDbError> {
        Ok(self.table.get(id))
    }
}

#[async_trait]
impl LastIdLookup for InMemoryCalllog {
    async fn get_last_id(&self) -> Result<RecordId, ServiceDbError> {
        Ok(self.table.last_id())
    }
}

/// Generic-query-only interface answering every query for its domain with
/// `Done(true)`, or failing when built with [`StubInterface::failing`].
pub struct StubInterface {
    domain: DomainId,
    fail: bool,
}

impl StubInterface {
    pub fn new(domain: DomainId) -> Self {
        Self {
            domain,
            fail: false,
        }
    }

    pub fn failing(domain: DomainId) -> Self {
        Self { domain, fail: true }
    }
}

#[async_trait]
impl RecordInterface for StubInterface {
    fn domain(&self) -> DomainId {
        self.domain
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        if query.domain() != self.domain {
            return Err(ServiceDbError::UnsupportedQuery {
                domain: self.domain,
                query: query.name(),
            });
        }
        if self.fail {
            return Err(failure(query.name()));
        }
        Ok(QueryResult::Done(true))
    }
}

/// A store whose snapshot is a small marker file.
pub struct FakeStore {
    kind: StoreKind,
    path: PathBuf,
    fail_snapshot: bool,
    journal: Journal,
}

impl FakeStore {
    pub fn new(kind: StoreKind, dir: &Path, journal: Journal) -> Self {
        Self {
            kind,
            path: dir.join("data").join(kind.file_name()),
            fail_snapshot: false,
            journal,
        }
    }

    #[must_use]
    pub fn failing_snapshot(mut self) -> Self {
        self.fail_snapshot = true;
        self
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    fn file_path(&self) -> &Path {
        &self.path
    }

    async fn store_into_file(&self, target: &Path) -> Result<(), ServiceDbError> {
        if self.fail_snapshot {
            return Err(failure("snapshot"));
        }
        std::fs::write(target, self.kind.as_str()).map_err(|err| ServiceDbError::Storage(err.into()))
    }

    async fn close(&self) {
        self.journal.record(format!("close store {}", self.kind));
    }
}

/// Agent echoing requests back as `Done(true)`.
pub struct FakeAgent {
    name: &'static str,
    path: PathBuf,
    claims: Vec<MessageType>,
    fail_init: bool,
    fail_snapshot: bool,
    journal: Journal,
}

impl FakeAgent {
    pub fn new(name: &'static str, claims: Vec<MessageType>, journal: Journal) -> Self {
        Self {
            name,
            path: PathBuf::from("/user").join(format!("{name}.db")),
            claims,
            fail_init: false,
            fail_snapshot: false,
            journal,
        }
    }

    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    #[must_use]
    pub fn failing_snapshot(mut self) -> Self {
        self.fail_snapshot = true;
        self
    }
}

#[async_trait]
impl DatabaseAgent for FakeAgent {
    fn agent_name(&self) -> &'static str {
        self.name
    }

    fn db_file_path(&self) -> &Path {
        &self.path
    }

    async fn init_db(&mut self) -> Result<(), ServiceDbError> {
        if self.fail_init {
            return Err(failure("agent init"));
        }
        self.journal.record(format!("init agent {}", self.name));
        Ok(())
    }

    fn register_messages(&self, registrar: &mut MessageRegistrar<'_>) {
        for claim in &self.claims {
            registrar.connect(*claim);
        }
    }

    async fn handle(&self, request: AgentRequest) -> Result<AgentResponse, ServiceDbError> {
        self.journal
            .record(format!("{} handled {}", self.name, request.message_type()));
        Ok(AgentResponse::Done(true))
    }

    async fn store_into_file(&self, target: &Path) -> Result<(), ServiceDbError> {
        if self.fail_snapshot {
            return Err(failure("agent snapshot"));
        }
        std::fs::write(target, self.name).map_err(|err| ServiceDbError::Storage(err.into()))
    }

    async fn close(&self) {
        self.journal.record(format!("close agent {}", self.name));
    }
}

/// Builds every store and interface a [`StoreSet`] needs, in memory.
pub fn store_set(dir: &Path, journal: &Journal) -> StoreSet<FakeStore> {
    StoreSet::from_open_order(
        StoreKind::OPEN_ORDER.map(|kind| FakeStore::new(kind, dir, journal.clone())),
    )
}

pub fn registry() -> InterfaceRegistry {
    let mut builder = InterfaceRegistry::builder()
        .contacts(Arc::new(InMemoryContacts::default()))
        .calllog(Arc::new(InMemoryCalllog::default()));
    for domain in DomainId::ALL {
        if !matches!(domain, DomainId::Contact | DomainId::Calllog) {
            builder = builder.register(Arc::new(StubInterface::new(domain)));
        }
    }
    builder.build().unwrap()
}

/// Engine handing out [`FakeStore`]s and recording what it did.
pub struct FakeEngine {
    pub dir: PathBuf,
    pub journal: Journal,
    pub fail_initialize: bool,
    pub fail_open: Option<StoreKind>,
    pub fail_agent_init: bool,
}

impl FakeEngine {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            journal: Journal::default(),
            fail_initialize: false,
            fail_open: None,
            fail_agent_init: false,
        }
    }
}

#[async_trait]
impl StoreEngine for FakeEngine {
    type Store = FakeStore;

    async fn initialize(&self) -> Result<(), ServiceDbError> {
        if self.fail_initialize {
            return Err(failure("engine init"));
        }
        self.journal.record("engine initialize");
        Ok(())
    }

    async fn open(&self, kind: StoreKind) -> Result<FakeStore, ServiceDbError> {
        if self.fail_open == Some(kind) {
            return Err(failure("open"));
        }
        self.journal.record(format!("open store {kind}"));
        Ok(FakeStore::new(kind, &self.dir, self.journal.clone()))
    }

    fn build_interfaces(
        &self,
        _stores: &StoreSet<FakeStore>,
    ) -> Result<InterfaceRegistry, RegistryError> {
        Ok(registry())
    }

    fn create_agents(&self) -> Vec<Box<dyn DatabaseAgent>> {
        let settings = FakeAgent::new(
            "settingsAgent",
            vec![MessageType::SettingsGet, MessageType::SettingsSet],
            self.journal.clone(),
        );
        let settings = if self.fail_agent_init {
            settings.failing_init()
        } else {
            settings
        };
        vec![
            Box::new(settings),
            Box::new(FakeAgent::new(
                "fileIndexerAgent",
                vec![MessageType::FileIndexerGet],
                self.journal.clone(),
            )),
        ]
    }

    async fn deinitialize(&self) {
        self.journal.record("engine deinitialize");
    }
}
