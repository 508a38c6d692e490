//! `SQLite` implementation of the contacts record interface.
//!
//! The lookup helpers at the bottom are also used by the SMS, thread and
//! call log interfaces, which hold a clone of the contacts pool.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use servicedb_app::ports::{ContactLookup, RecordCrud, RecordInterface};
use servicedb_domain::contact::{ContactNumber, ContactRecord, NumberKind, normalize_number};
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{ContactQuery, Page, Query, QueryResult};

use crate::error::StorageError;
use crate::rows::{affected, inserted_id, like_pattern, record_id, unsupported};

/// Wrapper for converting database rows into domain [`ContactRecord`]. Numbers
/// live in their own table and are attached afterwards.
struct Wrapper(ContactRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(ContactRecord {
            id: record_id(row, "id")?,
            primary_name: row.try_get("primary_name")?,
            alternative_name: row.try_get("alternative_name")?,
            numbers: Vec::new(),
            speed_dial: row.try_get("speed_dial")?,
            mail: row.try_get("mail")?,
            address: row.try_get("address")?,
            note: row.try_get("note")?,
            favourite: row.try_get("favourite")?,
            blocked: row.try_get("blocked")?,
            ice: row.try_get("ice")?,
            temporary: row.try_get("temporary")?,
        }))
    }
}

struct NumberWrapper(ContactNumber);

impl<'r> FromRow<'r, SqliteRow> for NumberWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        Ok(Self(ContactNumber {
            number: row.try_get("number")?,
            kind: NumberKind::from_storage(&kind),
        }))
    }
}

const INSERT: &str = "INSERT INTO contacts (primary_name, alternative_name, speed_dial, mail, address, note, favourite, blocked, ice, temporary) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE contacts SET primary_name = ?, alternative_name = ?, speed_dial = ?, mail = ?, address = ?, note = ?, favourite = ?, blocked = ?, ice = ?, temporary = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM contacts WHERE id = ?";
const SELECT_BY_ID: &str = "SELECT * FROM contacts WHERE id = ? AND temporary = 0";
const SELECT_BY_ID_WITH_TEMPORARY: &str = "SELECT * FROM contacts WHERE id = ?";
const SELECT_BY_SPEED_DIAL: &str =
    "SELECT * FROM contacts WHERE speed_dial = ? AND temporary = 0 ORDER BY id";
const SELECT_BY_NUMBER: &str = "SELECT c.* FROM contacts c JOIN contact_numbers n ON n.contact_id = c.id WHERE n.normalized = ? ORDER BY c.temporary ASC, c.id ASC LIMIT 1";
const SELECT_PAGE: &str = "SELECT * FROM contacts WHERE temporary = 0 ORDER BY primary_name, alternative_name, id LIMIT ? OFFSET ?";
const SELECT_SEARCH: &str = "SELECT * FROM contacts WHERE temporary = 0 AND (primary_name LIKE ? ESCAPE '\\' OR alternative_name LIKE ? ESCAPE '\\' OR id IN (SELECT contact_id FROM contact_numbers WHERE number LIKE ? ESCAPE '\\')) ORDER BY primary_name, alternative_name, id";
const COUNT: &str = "SELECT COUNT(*) FROM contacts WHERE temporary = 0";
const INSERT_NUMBER: &str = "INSERT INTO contact_numbers (contact_id, position, number, normalized, kind) VALUES (?, ?, ?, ?, ?)";
const DELETE_NUMBERS: &str = "DELETE FROM contact_numbers WHERE contact_id = ?";
const SELECT_NUMBERS: &str =
    "SELECT number, kind FROM contact_numbers WHERE contact_id = ? ORDER BY position";

/// `SQLite`-backed contacts interface.
pub struct SqliteContacts {
    pool: SqlitePool,
}

impl SqliteContacts {
    /// Create a new interface over the contacts store pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn list(&self, page: Page) -> Result<Vec<ContactRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PAGE)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        with_numbers(&self.pool, rows).await
    }

    async fn search(&self, text: &str) -> Result<Vec<ContactRecord>, StorageError> {
        let pattern = like_pattern(text);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_SEARCH)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;
        with_numbers(&self.pool, rows).await
    }

    async fn count(&self) -> Result<u32, StorageError> {
        let count: u32 = sqlx::query_scalar(COUNT).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

async fn insert_numbers(
    conn: &mut SqliteConnection,
    id: RecordId,
    numbers: &[ContactNumber],
) -> Result<(), StorageError> {
    for (position, number) in (0u32..).zip(numbers) {
        sqlx::query(INSERT_NUMBER)
            .bind(id.get())
            .bind(position)
            .bind(&number.number)
            .bind(number.normalized())
            .bind(number.kind.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn with_numbers(
    pool: &SqlitePool,
    rows: Vec<Wrapper>,
) -> Result<Vec<ContactRecord>, StorageError> {
    let mut contacts = Vec::with_capacity(rows.len());
    for Wrapper(mut contact) in rows {
        contact.numbers = numbers_of(pool, contact.id).await?;
        contacts.push(contact);
    }
    Ok(contacts)
}

async fn numbers_of(pool: &SqlitePool, id: RecordId) -> Result<Vec<ContactNumber>, StorageError> {
    let rows: Vec<NumberWrapper> = sqlx::query_as(SELECT_NUMBERS)
        .bind(id.get())
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|w| w.0).collect())
}

async fn fetch_one_by(
    pool: &SqlitePool,
    statement: &'static str,
    id: RecordId,
) -> Result<Option<ContactRecord>, StorageError> {
    let row: Option<Wrapper> = sqlx::query_as(statement)
        .bind(id.get())
        .fetch_optional(pool)
        .await?;
    Ok(with_numbers(pool, row.into_iter().collect()).await?.pop())
}

/// Contact owning `number` (digits compared, leading `+` kept), temporary
/// contacts included.
pub(crate) async fn find_by_number(
    pool: &SqlitePool,
    number: &str,
) -> Result<Option<ContactRecord>, StorageError> {
    let normalized = normalize_number(number);
    if normalized.is_empty() {
        return Ok(None);
    }
    let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NUMBER)
        .bind(normalized)
        .fetch_optional(pool)
        .await?;
    Ok(with_numbers(pool, row.into_iter().collect()).await?.pop())
}

/// Display name of contact `id`, if it exists.
pub(crate) async fn display_name_of(
    pool: &SqlitePool,
    id: RecordId,
) -> Result<Option<String>, StorageError> {
    if id.is_none() {
        return Ok(None);
    }
    let contact = fetch_one_by(pool, SELECT_BY_ID_WITH_TEMPORARY, id).await?;
    Ok(contact.map(|c| c.display_name()))
}

#[async_trait]
impl RecordInterface for SqliteContacts {
    fn domain(&self) -> DomainId {
        DomainId::Contact
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Contact(query) => query,
            other => return Err(unsupported(DomainId::Contact, &other)),
        };
        let result = match query {
            ContactQuery::List(page) => QueryResult::Contacts(self.list(page).await?),
            ContactQuery::Count => QueryResult::Count(self.count().await?),
            ContactQuery::Search(text) => QueryResult::Contacts(self.search(&text).await?),
        };
        Ok(result)
    }
}

#[async_trait]
impl RecordCrud<ContactRecord> for SqliteContacts {
    async fn add(&self, record: &ContactRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let result = sqlx::query(INSERT)
            .bind(&record.primary_name)
            .bind(&record.alternative_name)
            .bind(&record.speed_dial)
            .bind(&record.mail)
            .bind(&record.address)
            .bind(&record.note)
            .bind(record.favourite)
            .bind(record.blocked)
            .bind(record.ice)
            .bind(record.temporary)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let id = inserted_id(&result)?;
        insert_numbers(&mut tx, id, &record.numbers).await?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(id)
    }

    async fn update(&self, record: &ContactRecord) -> Result<bool, ServiceDbError> {
        record.validate()?;
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let result = sqlx::query(UPDATE)
            .bind(&record.primary_name)
            .bind(&record.alternative_name)
            .bind(&record.speed_dial)
            .bind(&record.mail)
            .bind(&record.address)
            .bind(&record.note)
            .bind(record.favourite)
            .bind(record.blocked)
            .bind(record.ice)
            .bind(record.temporary)
            .bind(record.id.get())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        if !affected(&result) {
            return Ok(false);
        }
        sqlx::query(DELETE_NUMBERS)
            .bind(record.id.get())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        insert_numbers(&mut tx, record.id, &record.numbers).await?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(true)
    }

    async fn remove_by_id(&self, id: RecordId) -> Result<bool, ServiceDbError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(affected(&result))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<ContactRecord>, ServiceDbError> {
        Ok(fetch_one_by(&self.pool, SELECT_BY_ID, id).await?)
    }
}

#[async_trait]
impl ContactLookup for SqliteContacts {
    async fn get_by_id_with_temporary(
        &self,
        id: RecordId,
    ) -> Result<Option<ContactRecord>, ServiceDbError> {
        Ok(fetch_one_by(&self.pool, SELECT_BY_ID_WITH_TEMPORARY, id).await?)
    }

    async fn get_by_speed_dial(
        &self,
        speed_dial: &str,
    ) -> Result<Vec<ContactRecord>, ServiceDbError> {
        if speed_dial.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_SPEED_DIAL)
            .bind(speed_dial)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(with_numbers(&self.pool, rows).await?)
    }

    async fn match_by_number(&self, number: &str) -> Result<Option<ContactRecord>, ServiceDbError> {
        Ok(find_by_number(&self.pool, number).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use servicedb_domain::domain_id::StoreKind;

    use super::*;
    use crate::store::SqliteStore;

    pub(crate) async fn open(dir: &std::path::Path) -> SqliteStore {
        SqliteStore::open(StoreKind::Contacts, dir.join("contacts.db"), 1)
            .await
            .unwrap()
    }

    fn jan() -> ContactRecord {
        ContactRecord::builder()
            .primary_name("Jan")
            .alternative_name("Kowalski")
            .number("+48 600 100 200", NumberKind::Cell)
            .number("22 123 45 67", NumberKind::Home)
            .speed_dial("2")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_added_contact_when_getting_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());

        let id = contacts.add(&jan()).await.unwrap();
        let found = contacts.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(id, RecordId::new(1));
        assert_eq!(found, ContactRecord { id, ..jan() });
    }

    #[tokio::test]
    async fn should_reject_empty_contact() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());

        let result = contacts.add(&ContactRecord::default()).await;

        assert!(matches!(result, Err(ServiceDbError::Validation(_))));
        assert_eq!(contacts.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_not_reuse_identity_after_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());

        let first = contacts.add(&jan()).await.unwrap();
        assert!(contacts.remove_by_id(first).await.unwrap());
        let second = contacts.add(&jan()).await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn should_report_failure_when_removing_missing_contact() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());
        contacts.add(&jan()).await.unwrap();

        assert!(!contacts.remove_by_id(RecordId::new(999)).await.unwrap());
        assert_eq!(contacts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_replace_numbers_when_updating() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());
        let id = contacts.add(&jan()).await.unwrap();

        let mut updated = contacts.get_by_id(id).await.unwrap().unwrap();
        updated.numbers = vec![ContactNumber::new("700800900", NumberKind::Work)];
        assert!(contacts.update(&updated).await.unwrap());

        let found = contacts.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.numbers, updated.numbers);
        assert!(contacts.match_by_number("+48600100200").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_report_failure_when_updating_missing_contact() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());

        let missing = ContactRecord {
            id: RecordId::new(5),
            ..jan()
        };
        assert!(!contacts.update(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn should_hide_temporary_contact_from_plain_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());
        let temporary = ContactRecord::builder()
            .number("600000001", NumberKind::Cell)
            .temporary(true)
            .build()
            .unwrap();
        let id = contacts.add(&temporary).await.unwrap();

        assert!(contacts.get_by_id(id).await.unwrap().is_none());
        assert!(contacts.get_by_id_with_temporary(id).await.unwrap().is_some());
        assert_eq!(contacts.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_match_number_ignoring_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());
        contacts.add(&jan()).await.unwrap();

        let found = contacts.match_by_number("+48-600-100-200").await.unwrap();

        assert_eq!(found.unwrap().primary_name, "Jan");
        assert!(contacts.match_by_number("600100200").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_find_contacts_by_speed_dial() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());
        contacts.add(&jan()).await.unwrap();

        assert_eq!(contacts.get_by_speed_dial("2").await.unwrap().len(), 1);
        assert!(contacts.get_by_speed_dial("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_run_list_search_and_count_queries() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());
        contacts.add(&jan()).await.unwrap();
        contacts
            .add(
                &ContactRecord::builder()
                    .primary_name("Anna")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let listed = contacts
            .run_query(Query::Contact(ContactQuery::List(Page::new(0, 1))))
            .await
            .unwrap();
        let searched = contacts
            .run_query(Query::Contact(ContactQuery::Search("kowal".into())))
            .await
            .unwrap();
        let by_number = contacts
            .run_query(Query::Contact(ContactQuery::Search("123 45".into())))
            .await
            .unwrap();
        let count = contacts
            .run_query(Query::Contact(ContactQuery::Count))
            .await
            .unwrap();

        let QueryResult::Contacts(listed) = listed else {
            panic!("expected contacts");
        };
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].primary_name, "Anna");
        assert!(matches!(searched, QueryResult::Contacts(ref c) if c.len() == 1));
        assert!(matches!(by_number, QueryResult::Contacts(ref c) if c.len() == 1));
        assert_eq!(count, QueryResult::Count(2));
    }

    #[tokio::test]
    async fn should_reject_query_for_other_domain() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        let contacts = SqliteContacts::new(store.pool().clone());

        let result = contacts
            .run_query(Query::Calllog(
                servicedb_domain::query::CalllogQuery::Count,
            ))
            .await;

        assert!(matches!(
            result,
            Err(ServiceDbError::UnsupportedQuery {
                domain: DomainId::Contact,
                ..
            })
        ));
    }
}
