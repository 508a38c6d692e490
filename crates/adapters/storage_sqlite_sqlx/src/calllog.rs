//! `SQLite` implementation of the call log record interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::{LastIdLookup, RecordCrud, RecordInterface};
use servicedb_domain::calllog::{CallType, CalllogRecord};
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{CalllogQuery, Page, Query, QueryResult};
use servicedb_domain::time;

use crate::contacts;
use crate::error::StorageError;
use crate::rows::{affected, inserted_id, record_id, timestamp, unsupported};

struct Wrapper(CalllogRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        Ok(Self(CalllogRecord {
            id: record_id(row, "id")?,
            number: row.try_get("number")?,
            contact_id: record_id(row, "contact_id")?,
            name: row.try_get("name")?,
            kind: CallType::from_storage(&kind),
            date: timestamp(row, "date")?,
            duration: row.try_get("duration")?,
            read: row.try_get("read")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO calls (number, contact_id, name, kind, date, duration, read) VALUES (?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE calls SET number = ?, contact_id = ?, name = ?, kind = ?, date = ?, duration = ?, read = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM calls WHERE id = ?";
const SELECT_BY_ID: &str = "SELECT * FROM calls WHERE id = ?";
const SELECT_PAGE: &str = "SELECT * FROM calls ORDER BY date DESC, id DESC LIMIT ? OFFSET ?";
const COUNT: &str = "SELECT COUNT(*) FROM calls";
const SET_ALL_READ: &str = "UPDATE calls SET read = 1 WHERE read = 0";
const LAST_ID: &str = "SELECT COALESCE(MAX(id), 0) FROM calls";

/// `SQLite`-backed call log interface. Peer names are resolved through the
/// contacts store.
pub struct SqliteCalllog {
    pool: SqlitePool,
    contacts: SqlitePool,
}

impl SqliteCalllog {
    #[must_use]
    pub fn new(pool: SqlitePool, contacts: SqlitePool) -> Self {
        Self { pool, contacts }
    }

    /// Fill in the peer of `record` from the phone book when it is unknown.
    async fn resolve_peer(&self, record: &mut CalllogRecord) -> Result<(), StorageError> {
        if record.contact_id.is_none()
            && let Some(contact) = contacts::find_by_number(&self.contacts, &record.number).await?
        {
            record.contact_id = contact.id;
            record.name = contact.display_name();
        }
        Ok(())
    }

    /// Refresh the stored name from the current contact, if it still exists.
    async fn with_name(&self, mut record: CalllogRecord) -> Result<CalllogRecord, StorageError> {
        if let Some(name) = contacts::display_name_of(&self.contacts, record.contact_id).await? {
            record.name = name;
        }
        Ok(record)
    }

    async fn list(&self, page: Page) -> Result<Vec<CalllogRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PAGE)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let mut calls = Vec::with_capacity(rows.len());
        for Wrapper(call) in rows {
            calls.push(self.with_name(call).await?);
        }
        Ok(calls)
    }

    async fn count(&self) -> Result<u32, StorageError> {
        let count: u32 = sqlx::query_scalar(COUNT).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn set_all_read(&self) -> Result<bool, StorageError> {
        sqlx::query(SET_ALL_READ).execute(&self.pool).await?;
        Ok(true)
    }
}

#[async_trait]
impl RecordInterface for SqliteCalllog {
    fn domain(&self) -> DomainId {
        DomainId::Calllog
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Calllog(query) => query,
            other => return Err(unsupported(DomainId::Calllog, &other)),
        };
        let result = match query {
            CalllogQuery::List(page) => QueryResult::Calls(self.list(page).await?),
            CalllogQuery::Count => QueryResult::Count(self.count().await?),
            CalllogQuery::SetAllRead => QueryResult::Done(self.set_all_read().await?),
        };
        Ok(result)
    }
}

#[async_trait]
impl RecordCrud<CalllogRecord> for SqliteCalllog {
    #[tracing::instrument(skip(self, record), fields(kind = record.kind.as_str()))]
    async fn add(&self, record: &CalllogRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        let mut record = record.clone();
        self.resolve_peer(&mut record).await?;
        let result = sqlx::query(INSERT)
            .bind(&record.number)
            .bind(record.contact_id.get())
            .bind(&record.name)
            .bind(record.kind.as_str())
            .bind(time::to_storage(record.date))
            .bind(record.duration)
            .bind(record.read)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(inserted_id(&result)?)
    }

    async fn update(&self, record: &CalllogRecord) -> Result<bool, ServiceDbError> {
        record.validate()?;
        let result = sqlx::query(UPDATE)
            .bind(&record.number)
            .bind(record.contact_id.get())
            .bind(&record.name)
            .bind(record.kind.as_str())
            .bind(time::to_storage(record.date))
            .bind(record.duration)
            .bind(record.read)
            .bind(record.id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(affected(&result))
    }

    async fn remove_by_id(&self, id: RecordId) -> Result<bool, ServiceDbError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(affected(&result))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<CalllogRecord>, ServiceDbError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        match row {
            Some(Wrapper(call)) => Ok(Some(self.with_name(call).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LastIdLookup for SqliteCalllog {
    async fn get_last_id(&self) -> Result<RecordId, ServiceDbError> {
        let last: u32 = sqlx::query_scalar(LAST_ID)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(RecordId::new(last))
    }
}
