//! `SQLite` implementation of the SMS template record interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{Query, QueryResult, SmsTemplateQuery};
use servicedb_domain::sms::SmsTemplateRecord;
use servicedb_domain::time;

use crate::error::StorageError;
use crate::rows::{affected, inserted_id, record_id, timestamp, unsupported};

struct Wrapper(SmsTemplateRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(SmsTemplateRecord {
            id: record_id(row, "id")?,
            text: row.try_get("text")?,
            last_usage: timestamp(row, "last_usage")?,
            order: row.try_get("position")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO templates (text, last_usage, position) VALUES (?, ?, ?)";
const UPDATE: &str = "UPDATE templates SET text = ?, last_usage = ?, position = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM templates WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM templates ORDER BY position, id";

/// `SQLite`-backed SMS template interface, sharing the SMS store.
pub struct SqliteSmsTemplates {
    pool: SqlitePool,
}

impl SqliteSmsTemplates {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn add(&self, record: &SmsTemplateRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        let result = sqlx::query(INSERT)
            .bind(&record.text)
            .bind(time::to_storage(record.last_usage))
            .bind(record.order)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(inserted_id(&result)?)
    }

    async fn update(&self, record: &SmsTemplateRecord) -> Result<bool, ServiceDbError> {
        record.validate()?;
        let result = sqlx::query(UPDATE)
            .bind(&record.text)
            .bind(time::to_storage(record.last_usage))
            .bind(record.order)
            .bind(record.id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(affected(&result))
    }

    async fn remove(&self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(affected(&result))
    }

    async fn list(&self) -> Result<Vec<SmsTemplateRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[async_trait]
impl RecordInterface for SqliteSmsTemplates {
    fn domain(&self) -> DomainId {
        DomainId::SmsTemplate
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::SmsTemplate(query) => query,
            other => return Err(unsupported(DomainId::SmsTemplate, &other)),
        };
        let result = match query {
            SmsTemplateQuery::Add(record) => QueryResult::Id(self.add(&record).await?),
            SmsTemplateQuery::Update(record) => QueryResult::Done(self.update(&record).await?),
            SmsTemplateQuery::Remove(id) => QueryResult::Done(self.remove(id).await?),
            SmsTemplateQuery::List => QueryResult::SmsTemplates(self.list().await?),
        };
        Ok(result)
    }
}
