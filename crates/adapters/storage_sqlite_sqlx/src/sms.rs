//! `SQLite` implementation of the SMS message record interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::contact::thread_address;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{Page, Query, QueryResult, SmsQuery};
use servicedb_domain::sms::{SmsRecord, SmsType};
use servicedb_domain::time;

use crate::error::StorageError;
use crate::rows::{inserted_id, record_id, timestamp, unsupported};
use crate::{contacts, threads};

struct Wrapper(SmsRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        Ok(Self(SmsRecord {
            id: record_id(row, "id")?,
            thread_id: record_id(row, "thread_id")?,
            contact_id: record_id(row, "contact_id")?,
            number: row.try_get("number")?,
            body: row.try_get("body")?,
            kind: SmsType::from_storage(&kind),
            date: timestamp(row, "date")?,
            read: row.try_get("read")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO sms (thread_id, contact_id, number, body, kind, date, read) VALUES (?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_THREAD: &str =
    "SELECT * FROM sms WHERE thread_id = ? ORDER BY date ASC, id ASC LIMIT ? OFFSET ?";
const SELECT_THREAD_OF: &str = "SELECT thread_id FROM sms WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM sms WHERE id = ?";
const COUNT: &str = "SELECT COUNT(*) FROM sms";

/// `SQLite`-backed SMS interface. Resolves senders through the contacts
/// store and keeps thread summaries in step with their messages.
pub struct SqliteSms {
    pool: SqlitePool,
    contacts: SqlitePool,
}

impl SqliteSms {
    #[must_use]
    pub fn new(pool: SqlitePool, contacts: SqlitePool) -> Self {
        Self { pool, contacts }
    }

    async fn add(&self, mut record: SmsRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        if record.contact_id.is_none()
            && let Some(contact) = contacts::find_by_number(&self.contacts, &record.number).await?
        {
            record.contact_id = contact.id;
        }
        let number = thread_address(&record.number);

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let thread_id =
            threads::get_or_create(&mut tx, &number, record.contact_id, record.kind, record.date)
                .await?;
        let result = sqlx::query(INSERT)
            .bind(thread_id.get())
            .bind(record.contact_id.get())
            .bind(&record.number)
            .bind(&record.body)
            .bind(record.kind.as_str())
            .bind(time::to_storage(record.date))
            .bind(record.read)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let id = inserted_id(&result)?;
        threads::refresh(&mut tx, thread_id).await?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(id)
    }

    async fn get_by_thread(
        &self,
        thread_id: RecordId,
        page: Page,
    ) -> Result<Vec<SmsRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_THREAD)
            .bind(thread_id.get())
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn remove(&self, id: RecordId) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;
        let thread_id: Option<u32> = sqlx::query_scalar(SELECT_THREAD_OF)
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(thread_id) = thread_id.map(RecordId::new) else {
            return Ok(false);
        };
        sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        threads::refresh(&mut tx, thread_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn count(&self) -> Result<u32, StorageError> {
        Ok(sqlx::query_scalar(COUNT).fetch_one(&self.pool).await?)
    }
}

#[async_trait]
impl RecordInterface for SqliteSms {
    fn domain(&self) -> DomainId {
        DomainId::SmsMessage
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Sms(query) => query,
            other => return Err(unsupported(DomainId::SmsMessage, &other)),
        };
        let result = match query {
            SmsQuery::Add(record) => QueryResult::Id(self.add(record).await?),
            SmsQuery::GetByThread { thread_id, page } => {
                QueryResult::Sms(self.get_by_thread(thread_id, page).await?)
            }
            SmsQuery::Remove(id) => QueryResult::Done(self.remove(id).await?),
            SmsQuery::Count => QueryResult::Count(self.count().await?),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use servicedb_app::ports::RecordCrud;
    use servicedb_domain::contact::{ContactRecord, NumberKind};
    use servicedb_domain::domain_id::StoreKind;
    use servicedb_domain::query::ThreadQuery;
    use servicedb_domain::sms::ThreadRecord;

    use super::*;
    use crate::contacts::SqliteContacts;
    use crate::store::SqliteStore;
    use crate::threads::SqliteThreads;

    struct Fixture {
        _dir: tempfile::TempDir,
        sms: SqliteSms,
        threads: SqliteThreads,
        contacts: SqliteContacts,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let contacts = crate::contacts::tests::open(dir.path()).await;
        let store = SqliteStore::open(StoreKind::Sms, dir.path().join("sms.db"), 1)
            .await
            .unwrap();
        Fixture {
            sms: SqliteSms::new(store.pool().clone(), contacts.pool().clone()),
            threads: SqliteThreads::new(store.pool().clone(), contacts.pool().clone()),
            contacts: SqliteContacts::new(contacts.pool().clone()),
            _dir: dir,
        }
    }

    async fn send(f: &Fixture, number: &str, body: &str, kind: SmsType) -> RecordId {
        let result = f
            .sms
            .run_query(Query::Sms(SmsQuery::Add(SmsRecord::new(number, body, kind))))
            .await
            .unwrap();
        let QueryResult::Id(id) = result else {
            panic!("expected id");
        };
        id
    }

    async fn thread(f: &Fixture, number: &str) -> Option<ThreadRecord> {
        let result = f
            .threads
            .run_query(Query::Thread(ThreadQuery::GetByNumber(number.into())))
            .await
            .unwrap();
        let QueryResult::Thread(thread) = result else {
            panic!("expected thread");
        };
        thread
    }

    #[tokio::test]
    async fn should_group_messages_of_one_number_into_a_thread() {
        let f = fixture().await;

        send(&f, "+48 600 100 200", "hello", SmsType::Inbox).await;
        send(&f, "+48600100200", "see you", SmsType::Outbox).await;

        let thread = thread(&f, "+48600100200").await.unwrap();
        assert_eq!(thread.msg_count, 2);
        assert_eq!(thread.unread_count, 1);
        assert_eq!(thread.snippet, "see you");
        assert_eq!(thread.last_kind, SmsType::Outbox);
    }

    #[tokio::test]
    async fn should_keep_alphanumeric_senders_in_separate_threads() {
        let f = fixture().await;

        send(&f, "Orange", "your balance is low", SmsType::Inbox).await;
        send(&f, "MyBank", "your code 1234", SmsType::Inbox).await;

        let result = f
            .threads
            .run_query(Query::Thread(ThreadQuery::List(Page::new(0, 10))))
            .await
            .unwrap();
        let QueryResult::Threads(threads) = result else {
            panic!("expected threads");
        };
        assert_eq!(threads.len(), 2);
        let orange = thread(&f, " Orange ").await.unwrap();
        assert_eq!(orange.number, "Orange");
        assert_eq!(orange.msg_count, 1);
        assert_eq!(orange.snippet, "your balance is low");
        let bank = thread(&f, "MyBank").await.unwrap();
        assert_eq!(bank.snippet, "your code 1234");
    }

    #[tokio::test]
    async fn should_resolve_sender_through_contacts() {
        let f = fixture().await;
        let jan = ContactRecord::builder()
            .primary_name("Jan")
            .number("600100200", NumberKind::Cell)
            .build()
            .unwrap();
        let contact_id = f.contacts.add(&jan).await.unwrap();

        send(&f, "600 100 200", "hi", SmsType::Inbox).await;

        let thread = thread(&f, "600100200").await.unwrap();
        assert_eq!(thread.contact_id, contact_id);
        assert_eq!(thread.display_name.as_deref(), Some("Jan"));
    }

    #[tokio::test]
    async fn should_delete_thread_with_its_last_message() {
        let f = fixture().await;
        let first = send(&f, "600100200", "one", SmsType::Inbox).await;
        let second = send(&f, "600100200", "two", SmsType::Inbox).await;

        let removed = f
            .sms
            .run_query(Query::Sms(SmsQuery::Remove(second)))
            .await
            .unwrap();
        assert_eq!(removed, QueryResult::Done(true));
        let remaining = thread(&f, "600100200").await.unwrap();
        assert_eq!(remaining.msg_count, 1);
        assert_eq!(remaining.snippet, "one");

        f.sms
            .run_query(Query::Sms(SmsQuery::Remove(first)))
            .await
            .unwrap();
        assert!(thread(&f, "600100200").await.is_none());
    }

    #[tokio::test]
    async fn should_report_failure_when_removing_missing_message() {
        let f = fixture().await;

        let removed = f
            .sms
            .run_query(Query::Sms(SmsQuery::Remove(RecordId::new(9))))
            .await
            .unwrap();

        assert_eq!(removed, QueryResult::Done(false));
    }

    #[tokio::test]
    async fn should_page_messages_of_a_thread() {
        let f = fixture().await;
        for body in ["a", "b", "c"] {
            send(&f, "600100200", body, SmsType::Outbox).await;
        }
        let thread_id = thread(&f, "600100200").await.unwrap().id;

        let page = f
            .sms
            .run_query(Query::Sms(SmsQuery::GetByThread {
                thread_id,
                page: Page::new(1, 5),
            }))
            .await
            .unwrap();
        let count = f.sms.run_query(Query::Sms(SmsQuery::Count)).await.unwrap();

        let QueryResult::Sms(messages) = page else {
            panic!("expected messages");
        };
        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["b", "c"]);
        assert_eq!(count, QueryResult::Count(3));
    }

    #[tokio::test]
    async fn should_mark_thread_read_and_remove_it() {
        let f = fixture().await;
        send(&f, "600100200", "one", SmsType::Inbox).await;
        send(&f, "600100200", "two", SmsType::Inbox).await;
        let id = thread(&f, "600100200").await.unwrap().id;

        let marked = f
            .threads
            .run_query(Query::Thread(ThreadQuery::MarkAsRead { id, read: true }))
            .await
            .unwrap();
        assert_eq!(marked, QueryResult::Done(true));
        assert_eq!(thread(&f, "600100200").await.unwrap().unread_count, 0);

        let listed = f
            .threads
            .run_query(Query::Thread(ThreadQuery::List(Page::all())))
            .await
            .unwrap();
        assert!(matches!(listed, QueryResult::Threads(ref t) if t.len() == 1));

        let removed = f
            .threads
            .run_query(Query::Thread(ThreadQuery::Remove(id)))
            .await
            .unwrap();
        assert_eq!(removed, QueryResult::Done(true));
        let count = f.sms.run_query(Query::Sms(SmsQuery::Count)).await.unwrap();
        assert_eq!(count, QueryResult::Count(0));
    }
}
