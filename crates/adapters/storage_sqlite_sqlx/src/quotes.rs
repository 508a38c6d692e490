//! `SQLite` implementation of the quotes record interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::{Page, Query, QueryResult, QuoteQuery};
use servicedb_domain::quote::QuoteRecord;

use crate::error::StorageError;
use crate::rows::{affected, inserted_id, record_id, unsupported};

struct Wrapper(QuoteRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<QuoteRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(QuoteRecord {
            id: record_id(row, "id")?,
            text: row.try_get("text")?,
            author: row.try_get("author")?,
            enabled: row.try_get("enabled")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO quotes (text, author, enabled) VALUES (?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM quotes WHERE id = ?";
const SELECT_PAGE: &str = "SELECT * FROM quotes ORDER BY id LIMIT ? OFFSET ?";
const DELETE_BY_ID: &str = "DELETE FROM quotes WHERE id = ?";

/// `SQLite`-backed quotes interface.
pub struct SqliteQuotes {
    pool: SqlitePool,
}

impl SqliteQuotes {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn add(&self, record: &QuoteRecord) -> Result<RecordId, ServiceDbError> {
        record.validate()?;
        let result = sqlx::query(INSERT)
            .bind(&record.text)
            .bind(&record.author)
            .bind(record.enabled)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(inserted_id(&result)?)
    }

    async fn get(&self, id: RecordId) -> Result<Option<QuoteRecord>, StorageError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(Wrapper::maybe(row))
    }

    async fn list(&self, page: Page) -> Result<Vec<QuoteRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PAGE)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn remove(&self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(affected(&result))
    }
}

#[async_trait]
impl RecordInterface for SqliteQuotes {
    fn domain(&self) -> DomainId {
        DomainId::Quotes
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Quote(query) => query,
            other => return Err(unsupported(DomainId::Quotes, &other)),
        };
        let result = match query {
            QuoteQuery::Add(record) => QueryResult::Id(self.add(&record).await?),
            QuoteQuery::Get(id) => QueryResult::Quote(self.get(id).await?),
            QuoteQuery::List(page) => QueryResult::Quotes(self.list(page).await?),
            QuoteQuery::Remove(id) => QueryResult::Done(self.remove(id).await?),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use servicedb_domain::domain_id::StoreKind;

    use super::*;
    use crate::store::SqliteStore;

    #[tokio::test]
    async fn should_return_added_quote_when_getting_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(StoreKind::Quotes, dir.path().join("quotes.db"), 1)
            .await
            .unwrap();
        let quotes = SqliteQuotes::new(store.pool().clone());
        let quote = QuoteRecord::new("Simplicity is prerequisite for reliability.", "Dijkstra");

        let added = quotes
            .run_query(Query::Quote(QuoteQuery::Add(quote.clone())))
            .await
            .unwrap();
        let QueryResult::Id(id) = added else {
            panic!("expected id");
        };
        let fetched = quotes
            .run_query(Query::Quote(QuoteQuery::Get(id)))
            .await
            .unwrap();

        assert_eq!(fetched, QueryResult::Quote(Some(QuoteRecord { id, ..quote })));
    }

    #[tokio::test]
    async fn should_page_and_remove_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(StoreKind::Quotes, dir.path().join("quotes.db"), 1)
            .await
            .unwrap();
        let quotes = SqliteQuotes::new(store.pool().clone());
        for n in 0..3 {
            quotes
                .add(&QuoteRecord::new(format!("quote {n}"), ""))
                .await
                .unwrap();
        }

        let page = quotes.list(Page::new(1, 1)).await.unwrap();
        assert_eq!(page[0].text, "quote 1");
        assert!(quotes.remove(page[0].id).await.unwrap());
        assert!(quotes.get(page[0].id).await.unwrap().is_none());
    }
}
