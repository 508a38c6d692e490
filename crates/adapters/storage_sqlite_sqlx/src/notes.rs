//! `SQLite` implementation of the notes record interface.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::ports::RecordInterface;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::note::NoteRecord;
use servicedb_domain::query::{NoteQuery, Page, Query, QueryResult};
use servicedb_domain::time;

use crate::error::StorageError;
use crate::rows::{affected, inserted_id, like_pattern, record_id, timestamp, unsupported};

struct Wrapper(NoteRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(NoteRecord {
            id: record_id(row, "id")?,
            text: row.try_get("text")?,
            date: timestamp(row, "date")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO notes (text, date) VALUES (?, ?)";
const UPDATE: &str = "UPDATE notes SET text = ?, date = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM notes WHERE id = ?";
const SELECT_PAGE: &str = "SELECT * FROM notes ORDER BY date DESC, id DESC LIMIT ? OFFSET ?";
const SELECT_SEARCH: &str =
    "SELECT * FROM notes WHERE text LIKE ? ESCAPE '\\' ORDER BY date DESC, id DESC";

/// `SQLite`-backed notes interface.
pub struct SqliteNotes {
    pool: SqlitePool,
}

impl SqliteNotes {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn add(&self, record: &NoteRecord) -> Result<RecordId, StorageError> {
        let result = sqlx::query(INSERT)
            .bind(&record.text)
            .bind(time::to_storage(record.date))
            .execute(&self.pool)
            .await?;
        inserted_id(&result)
    }

    async fn update(&self, record: &NoteRecord) -> Result<bool, StorageError> {
        let result = sqlx::query(UPDATE)
            .bind(&record.text)
            .bind(time::to_storage(record.date))
            .bind(record.id.get())
            .execute(&self.pool)
            .await?;
        Ok(affected(&result))
    }

    async fn remove(&self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(affected(&result))
    }

    async fn list(&self, page: Page) -> Result<Vec<NoteRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PAGE)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn search(&self, text: &str) -> Result<Vec<NoteRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_SEARCH)
            .bind(like_pattern(text))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[async_trait]
impl RecordInterface for SqliteNotes {
    fn domain(&self) -> DomainId {
        DomainId::Notes
    }

    async fn run_query(&self, query: Query) -> Result<QueryResult, ServiceDbError> {
        let query = match query {
            Query::Note(query) => query,
            other => return Err(unsupported(DomainId::Notes, &other)),
        };
        let result = match query {
            NoteQuery::Add(record) => QueryResult::Id(self.add(&record).await?),
            NoteQuery::Update(record) => QueryResult::Done(self.update(&record).await?),
            NoteQuery::Remove(id) => QueryResult::Done(self.remove(id).await?),
            NoteQuery::List(page) => QueryResult::Notes(self.list(page).await?),
            NoteQuery::Search(text) => QueryResult::Notes(self.search(&text).await?),
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
    async fn should_find_notes_by_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(StoreKind::Notes, dir.path().join("notes.db"), 1)
            .await
            .unwrap();
        let notes = SqliteNotes::new(store.pool().clone());
        notes.add(&NoteRecord::new("Buy milk")).await.unwrap();
        notes.add(&NoteRecord::new("Call the plumber")).await.unwrap();

        let found = notes
            .run_query(Query::Note(NoteQuery::Search("MILK".into())))
            .await
            .unwrap();
        let all = notes
            .run_query(Query::Note(NoteQuery::List(Page::all())))
            .await
            .unwrap();

        let QueryResult::Notes(found) = found else {
            panic!("expected notes");
        };
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Buy milk");
        assert!(matches!(all, QueryResult::Notes(ref n) if n.len() == 2));
    }

    #[tokio::test]
    async fn should_update_note_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(StoreKind::Notes, dir.path().join("notes.db"), 1)
            .await
            .unwrap();
        let notes = SqliteNotes::new(store.pool().clone());
        let id = notes.add(&NoteRecord::new("draft")).await.unwrap();

        let mut edited = NoteRecord::new("final");
        edited.id = id;
        let updated = notes
            .run_query(Query::Note(NoteQuery::Update(edited.clone())))
            .await
            .unwrap();

        assert_eq!(updated, QueryResult::Done(true));
        assert_eq!(notes.list(Page::all()).await.unwrap(), vec![edited]);
    }
}
