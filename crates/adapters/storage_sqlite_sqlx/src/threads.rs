//! `SQLite` implementation of the SMS thread record interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::contact::thread_address;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{Page, Query, QueryResult, ThreadQuery};
use servicedb_domain::sms::{SmsType, ThreadRecord};
use servicedb_domain::time;

use crate::contacts;
use crate::error::StorageError;
use crate::rows::{affected, record_id, timestamp, unsupported};

pub(crate) struct Wrapper(pub(crate) ThreadRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let last_kind: String = row.try_get("last_kind")?;
        Ok(Self(ThreadRecord {
            id: record_id(row, "id")?,
            number: row.try_get("number")?,
            contact_id: record_id(row, "contact_id")?,
            snippet: row.try_get("snippet")?,
            date: timestamp(row, "date")?,
            msg_count: row.try_get("msg_count")?,
            unread_count: row.try_get("unread_count")?,
            last_kind: SmsType::from_storage(&last_kind),
            display_name: None,
        }))
    }
}

const SELECT_PAGE: &str = "SELECT * FROM threads ORDER BY date DESC, id DESC LIMIT ? OFFSET ?";
const SELECT_BY_NUMBER: &str = "SELECT * FROM threads WHERE number = ?";
const MARK_MESSAGES: &str = "UPDATE sms SET read = ? WHERE thread_id = ?";
const DELETE_MESSAGES: &str = "DELETE FROM sms WHERE thread_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM threads WHERE id = ?";
const INSERT: &str = "INSERT INTO threads (number, contact_id, snippet, date, msg_count, unread_count, last_kind) VALUES (?, ?, '', ?, 0, 0, ?)";
const COUNTERS: &str =
    "SELECT COUNT(*), COALESCE(SUM(CASE WHEN read = 0 THEN 1 ELSE 0 END), 0) FROM sms WHERE thread_id = ?";
const LATEST_MESSAGE: &str =
    "SELECT body, date, kind FROM sms WHERE thread_id = ? ORDER BY date DESC, id DESC LIMIT 1";
const UPDATE_SUMMARY: &str = "UPDATE threads SET snippet = ?, date = ?, last_kind = ?, msg_count = ?, unread_count = ? WHERE id = ?";
const UPDATE_COUNTERS: &str = "UPDATE threads SET msg_count = ?, unread_count = ? WHERE id = ?";
const UPDATE_CONTACT: &str = "UPDATE threads SET contact_id = ? WHERE id = ? AND contact_id != ?";

/// Thread for `number` (already normalized), created empty when missing.
pub(crate) async fn get_or_create(
    conn: &mut SqliteConnection,
    number: &str,
    contact_id: RecordId,
    kind: SmsType,
    date: time::Timestamp,
) -> Result<RecordId, StorageError> {
    let existing: Option<Wrapper> = sqlx::query_as(SELECT_BY_NUMBER)
        .bind(number)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(Wrapper(thread)) = existing {
        if contact_id.is_assigned() {
            sqlx::query(UPDATE_CONTACT)
                .bind(contact_id.get())
                .bind(thread.id.get())
                .bind(contact_id.get())
                .execute(&mut *conn)
                .await?;
        }
        return Ok(thread.id);
    }
    let result = sqlx::query(INSERT)
        .bind(number)
        .bind(contact_id.get())
        .bind(time::to_storage(date))
        .bind(kind.as_str())
        .execute(&mut *conn)
        .await?;
    crate::rows::inserted_id(&result)
}

/// Recompute a thread's counters and summary from its messages; a thread
/// left without messages is deleted.
pub(crate) async fn refresh(conn: &mut SqliteConnection, id: RecordId) -> Result<(), StorageError> {
    let (total, unread): (u32, u32) = sqlx::query_as(COUNTERS)
        .bind(id.get())
        .fetch_one(&mut *conn)
        .await?;
    if total == 0 {
        sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&mut *conn)
            .await?;
        return Ok(());
    }
    let (snippet, date, kind): (String, String, String) = sqlx::query_as(LATEST_MESSAGE)
        .bind(id.get())
        .fetch_one(&mut *conn)
        .await?;
    sqlx::query(UPDATE_SUMMARY)
        .bind(snippet)
        .bind(date)
        .bind(kind)
        .bind(total)
        .bind(unread)
        .bind(id.get())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// `SQLite`-backed thread interface. Reads the contacts store to resolve
/// display names.
pub struct SqliteThreads {
    pool: SqlitePool,
    contacts: SqlitePool,
}

impl SqliteThreads {
    #[must_use]
    pub fn new(pool: SqlitePool, contacts: SqlitePool) -> Self {
        Self { pool, contacts }
    }

    async fn resolve(&self, mut thread: ThreadRecord) -> Result<ThreadRecord, StorageError> {
        thread.display_name = if thread.contact_id.is_assigned() {
            contacts::display_name_of(&self.contacts, thread.contact_id).await?
        } else {
            contacts::find_by_number(&self.contacts, &thread.number)
                .await?
                .map(|c| c.display_name())
        };
        Ok(thread)
    }

    async fn list(&self, page: Page) -> Result<Vec<ThreadRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PAGE)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let mut threads = Vec::with_capacity(rows.len());
        for Wrapper(thread) in rows {
            threads.push(self.resolve(thread).await?);
        }
        Ok(threads)
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<ThreadRecord>, StorageError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NUMBER)
            .bind(thread_address(number))
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(Wrapper(thread)) => Ok(Some(self.resolve(thread).await?)),
            None => Ok(None),
        }
    }

    async fn mark_as_read(&self, id: RecordId, read: bool) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(MARK_MESSAGES)
            .bind(read)
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        let (total, unread): (u32, u32) = sqlx::query_as(COUNTERS)
            .bind(id.get())
            .fetch_one(&mut *tx)
            .await?;
        let result = sqlx::query(UPDATE_COUNTERS)
            .bind(total)
            .bind(unread)
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(affected(&result))
    }

    async fn remove(&self, id: RecordId) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(DELETE_MESSAGES)
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(affected(&result))
    }
}

#[async_trait]
impl RecordInterface for SqliteThreads {
    fn domain(&self) -> DomainId {
        DomainId::SmsThread
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Thread(query) => query,
            other => return Err(unsupported(DomainId::SmsThread, &other)),
        };
        let result = match query {
            ThreadQuery::List(page) => QueryResult::Threads(self.list(page).await?),
            ThreadQuery::GetByNumber(number) => {
                QueryResult::Thread(self.get_by_number(&number).await?)
            }
            ThreadQuery::MarkAsRead { id, read } => {
                QueryResult::Done(self.mark_as_read(id, read).await?)
            }
            ThreadQuery::Remove(id) => QueryResult::Done(self.remove(id).await?),
        };
        Ok(result)
    }
}
