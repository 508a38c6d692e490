//! `SQLite` implementation of the alarms record interface.

use async_trait::async_trait;
use chrono::Weekday;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::alarm::AlarmRecord;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{AlarmQuery, Query, QueryResult};

use crate::error::StorageError;
use crate::rows::{affected, decode_error, inserted_id, record_id, unsupported};

struct Wrapper(AlarmRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let repeat: String = row.try_get("repeat")?;
        let repeat: Vec<Weekday> = serde_json::from_str(&repeat).map_err(decode_error)?;
        Ok(Self(AlarmRecord {
            id: record_id(row, "id")?,
            hour: row.try_get("hour")?,
            minute: row.try_get("minute")?,
            enabled: row.try_get("enabled")?,
            snooze_minutes: row.try_get("snooze_minutes")?,
            tone: row.try_get("tone")?,
            repeat,
        }))
    }
}

const INSERT: &str = "INSERT INTO alarms (hour, minute, enabled, snooze_minutes, tone, repeat) VALUES (?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE alarms SET hour = ?, minute = ?, enabled = ?, snooze_minutes = ?, tone = ?, repeat = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM alarms WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM alarms ORDER BY hour, minute, id";
const TURN_OFF_ALL: &str = "UPDATE alarms SET enabled = 0 WHERE enabled = 1";

/// `SQLite`-backed alarms interface.
pub struct SqliteAlarms {
    pool: SqlitePool,
}

impl SqliteAlarms {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn add(&self, record: &AlarmRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        let repeat = serde_json::to_string(&record.repeat).map_err(StorageError::from)?;
        let result = sqlx::query(INSERT)
            .bind(record.hour)
            .bind(record.minute)
            .bind(record.enabled)
            .bind(record.snooze_minutes)
            .bind(&record.tone)
            .bind(repeat)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(inserted_id(&result)?)
    }

    async fn update(&self, record: &AlarmRecord) -> Result<bool, ServiceDbError> {
        record.validate()?;
        let repeat = serde_json::to_string(&record.repeat).map_err(StorageError::from)?;
        let result = sqlx::query(UPDATE)
            .bind(record.hour)
            .bind(record.minute)
            .bind(record.enabled)
            .bind(record.snooze_minutes)
            .bind(&record.tone)
            .bind(repeat)
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

    async fn list(&self) -> Result<Vec<AlarmRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn turn_off_all(&self) -> Result<bool, StorageError> {
        sqlx::query(TURN_OFF_ALL).execute(&self.pool).await?;
        Ok(true)
    }
}

#[async_trait]
impl RecordInterface for SqliteAlarms {
    fn domain(&self) -> DomainId {
        DomainId::Alarms
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Alarm(query) => query,
            other => return Err(unsupported(DomainId::Alarms, &other)),
        };
        let result = match query {
            AlarmQuery::Add(record) => QueryResult::Id(self.add(&record).await?),
            AlarmQuery::Update(record) => QueryResult::Done(self.update(&record).await?),
            AlarmQuery::Remove(id) => QueryResult::Done(self.remove(id).await?),
            AlarmQuery::List => QueryResult::Alarms(self.list().await?),
            AlarmQuery::TurnOffAll => QueryResult::Done(self.turn_off_all().await?),
        };
        Ok(result)
    }
}
