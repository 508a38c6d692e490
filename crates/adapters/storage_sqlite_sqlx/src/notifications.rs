//! `SQLite` implementation of the notification counter interface.

use std::sync::Weak;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::{ContactLookup, RecordInterface};
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::notifications::{NotificationKey, NotificationRecord};
use servicedb_domain::query::{NotificationsQuery, Query, QueryResult};

use crate::error::StorageError;
use crate::rows::{affected, decode_error, record_id, unsupported};

#[derive(Debug, thiserror::Error)]
#[error("unknown notification key {0:?}")]
struct UnknownKey(String);

struct Wrapper(NotificationRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let key: String = row.try_get("key")?;
        let key = NotificationKey::from_storage(&key).ok_or_else(|| decode_error(UnknownKey(key)))?;
        Ok(Self(NotificationRecord {
            id: record_id(row, "id")?,
            key,
            value: row.try_get("value")?,
            contact_id: record_id(row, "contact_id")?,
        }))
    }
}

const SELECT_BY_KEY: &str = "SELECT * FROM notifications WHERE key = ?";
const SELECT_ALL: &str = "SELECT * FROM notifications ORDER BY id";
// The counter remembers its contact only while every counted event came
// from that same contact.
const INCREMENT: &str = "UPDATE notifications SET contact_id = CASE WHEN value = 0 THEN ? WHEN contact_id = ? THEN contact_id ELSE 0 END, value = value + 1 WHERE key = ?";
const CLEAR: &str = "UPDATE notifications SET value = 0, contact_id = 0 WHERE key = ?";

/// `SQLite`-backed notification counters.
///
/// Numbers are matched to contacts through the contacts interface, which
/// this interface does not keep alive.
pub struct SqliteNotifications {
    pool: SqlitePool,
    contacts: Weak<dyn ContactLookup>,
}

impl SqliteNotifications {
    #[must_use]
    pub fn new(pool: SqlitePool, contacts: Weak<dyn ContactLookup>) -> Self {
        Self { pool, contacts }
    }

    async fn get(&self, key: NotificationKey) -> Result<Option<NotificationRecord>, StorageError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_KEY)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|w| w.0))
    }

    async fn list(&self) -> Result<Vec<NotificationRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn contact_of(&self, number: Option<&str>) -> Result<RecordId, ServiceDbError> {
        let Some(number) = number else {
            return Ok(RecordId::NONE);
        };
        let contacts = self
            .contacts
            .upgrade()
            .ok_or(ServiceDbError::Released("contacts interface"))?;
        let contact = contacts.match_by_number(number).await?;
        Ok(contact.map_or(RecordId::NONE, |c| c.id))
    }

    async fn increment(
        &self,
        key: NotificationKey,
        number: Option<&str>,
    ) -> Result<bool, ServiceDbError> {
        let contact_id = self.contact_of(number).await?;
        let result = sqlx::query(INCREMENT)
            .bind(contact_id.get())
            .bind(contact_id.get())
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(affected(&result))
    }

    async fn clear(&self, key: NotificationKey) -> Result<bool, StorageError> {
        let result = sqlx::query(CLEAR)
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(affected(&result))
    }
}

#[async_trait]
impl RecordInterface for SqliteNotifications {
    fn domain(&self) -> DomainId {
        DomainId::Notifications
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Notifications(query) => query,
            other => return Err(unsupported(DomainId::Notifications, &other)),
        };
        let result = match query {
            NotificationsQuery::Get(key) => QueryResult::Notification(self.get(key).await?),
            NotificationsQuery::List => QueryResult::Notifications(self.list().await?),
            NotificationsQuery::Increment { key, number } => {
                QueryResult::Done(self.increment(key, number.as_deref()).await?)
            }
            NotificationsQuery::Clear(key) => QueryResult::Done(self.clear(key).await?),
        };
        Ok(result)
    }
}
