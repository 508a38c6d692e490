//! `SQLite` implementation of the read-only country code interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::country_code::CountryCodeRecord;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::query::{CountryCodeQuery, Query, QueryResult};

use crate::error::StorageError;
use crate::rows::{record_id, unsupported};

struct Wrapper(CountryCodeRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(CountryCodeRecord {
            id: record_id(row, "id")?,
            mcc: row.try_get("mcc")?,
            iso: row.try_get("iso")?,
            country: row.try_get("country")?,
            code: row.try_get("code")?,
        }))
    }
}

const SELECT_BY_MCC: &str = "SELECT * FROM country_codes WHERE mcc = ?";

pub struct SqliteCountryCodes {
    pool: SqlitePool,
}

impl SqliteCountryCodes {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn by_mcc(&self, mcc: u32) -> Result<Option<CountryCodeRecord>, StorageError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_MCC)
            .bind(mcc)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|w| w.0))
    }
}

#[async_trait]
impl RecordInterface for SqliteCountryCodes {
    fn domain(&self) -> DomainId {
        DomainId::CountryCodes
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        match query {
            Query::CountryCode(CountryCodeQuery::ByMcc(mcc)) => {
                Ok(QueryResult::CountryCode(self.by_mcc(mcc).await?))
            }
            other => Err(unsupported(DomainId::CountryCodes, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use servicedb_domain::domain_id::StoreKind;

    use super::*;
    use crate::store::SqliteStore;

    #[tokio::test]
    async fn should_resolve_seeded_mcc() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(
            StoreKind::CountryCodes,
            dir.path().join("country-codes.db"),
            1,
        )
        .await
        .unwrap();
        let codes = SqliteCountryCodes::new(store.pool().clone());

        let poland = codes
            .run_query(Query::CountryCode(CountryCodeQuery::ByMcc(260)))
            .await
            .unwrap();
        let unknown = codes.by_mcc(999).await.unwrap();

        let QueryResult::CountryCode(Some(poland)) = poland else {
            panic!("expected Poland");
        };
        assert_eq!(poland.iso, "PL");
        assert_eq!(poland.code, 48);
        assert!(unknown.is_none());
    }
}
