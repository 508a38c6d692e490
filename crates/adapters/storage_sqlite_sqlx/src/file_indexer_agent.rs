//! File indexer agent: metadata (size, MIME type) of files on user storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::agents::MessageRegistrar;
use servicedb_app::ports::DatabaseAgent;
use servicedb_domain::agent::{AgentRequest, AgentResponse, FileIndexEntry, FileIndexerRequest};
use servicedb_domain::error::{ServiceDbError, ValidationError};
use servicedb_domain::message::MessageType;

use crate::error::StorageError;
use crate::rows::{affected, decode_error};
use crate::store::{self, FILE_INDEXER};

pub const FILE_INDEXER_AGENT_NAME: &str = "fileIndexerAgent";
pub const FILE_INDEXER_FILE_NAME: &str = "file_indexer.db";

struct Wrapper(FileIndexEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let size: i64 = row.try_get("size")?;
        Ok(Self(FileIndexEntry {
            path: row.try_get("path")?,
            size: u64::try_from(size).map_err(decode_error)?,
            mime: row.try_get("mime")?,
        }))
    }
}

const UPSERT: &str = "INSERT INTO files (path, size, mime) VALUES (?, ?, ?) ON CONFLICT(path) DO UPDATE SET size = excluded.size, mime = excluded.mime";
const SELECT_BY_PATH: &str = "SELECT * FROM files WHERE path = ?";
const DELETE: &str = "DELETE FROM files WHERE path = ?";
const SELECT_BY_MIME: &str = "SELECT * FROM files WHERE mime = ? ORDER BY path";

pub struct FileIndexerAgent {
    path: PathBuf,
    max_connections: u32,
    pool: Option<SqlitePool>,
}

impl FileIndexerAgent {
    #[must_use]
    pub fn new(user_dir: &Path, max_connections: u32) -> Self {
        Self {
            path: user_dir.join(FILE_INDEXER_FILE_NAME),
            max_connections,
            pool: None,
        }
    }

    fn pool(&self) -> Result<&SqlitePool, StorageError> {
        self.pool
            .as_ref()
            .ok_or(StorageError::NotOpen(FILE_INDEXER_AGENT_NAME))
    }

    async fn register(&self, entry: &FileIndexEntry) -> Result<bool, ServiceDbError> {
        if entry.path.trim().is_empty() {
            return Err(ValidationError::EmptyPath.into());
        }
        // SQLite integers are signed; clamp rather than wrap.
        let size = i64::try_from(entry.size).unwrap_or(i64::MAX);
        sqlx::query(UPSERT)
            .bind(&entry.path)
            .bind(size)
            .bind(&entry.mime)
            .execute(self.pool()?)
            .await
            .map_err(StorageError::from)?;
        Ok(true)
    }

    async fn get(&self, path: &str) -> Result<Option<FileIndexEntry>, StorageError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_PATH)
            .bind(path)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row.map(|w| w.0))
    }

    async fn remove(&self, path: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(DELETE)
            .bind(path)
            .execute(self.pool()?)
            .await?;
        Ok(affected(&result))
    }

    async fn list_by_mime(&self, mime: &str) -> Result<Vec<FileIndexEntry>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_MIME)
            .bind(mime)
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[async_trait]
impl DatabaseAgent for FileIndexerAgent {
    fn agent_name(&self) -> &'static str {
        FILE_INDEXER_AGENT_NAME
    }

    fn db_file_path(&self) -> &Path {
        &self.path
    }

    async fn init_db(&mut self) -> Result<(), ServiceDbError> {
        let pool = store::connect(&self.path, self.max_connections, &FILE_INDEXER).await?;
        self.pool = Some(pool);
        tracing::info!(path = %self.path.display(), "file index database ready");
        Ok(())
    }

    fn register_messages(&self, registrar: &mut MessageRegistrar<'_>) {
        registrar.connect(MessageType::FileIndexerRegister);
        registrar.connect(MessageType::FileIndexerGet);
        registrar.connect(MessageType::FileIndexerRemove);
        registrar.connect(MessageType::FileIndexerListByMime);
    }

    async fn handle(&self, request: AgentRequest) -> Result<AgentResponse, ServiceDbError> {
        let request = match request {
            AgentRequest::FileIndexer(request) => request,
            other => {
                return Err(ServiceDbError::UnsupportedAgentRequest {
                    agent: FILE_INDEXER_AGENT_NAME,
                    message: other.message_type(),
                });
            }
        };
        let response = match request {
            FileIndexerRequest::Register(entry) => AgentResponse::Done(self.register(&entry).await?),
            FileIndexerRequest::Get { path } => AgentResponse::File(self.get(&path).await?),
            FileIndexerRequest::Remove { path } => AgentResponse::Done(self.remove(&path).await?),
            FileIndexerRequest::ListByMime { mime } => {
                AgentResponse::Files(self.list_by_mime(&mime).await?)
            }
        };
        Ok(response)
    }

    async fn store_into_file(&self, target: &Path) -> Result<(), ServiceDbError> {
        store::vacuum_into(self.pool()?, target).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
