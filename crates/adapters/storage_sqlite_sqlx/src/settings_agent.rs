//! Settings agent: a slash-separated key/value space in its own database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use servicedb_app::agents::MessageRegistrar;
use servicedb_app::backup::SETTINGS_AGENT_NAME;
use servicedb_app::ports::DatabaseAgent;
use servicedb_domain::agent::{AgentRequest, AgentResponse, SettingsEntry, SettingsRequest};
use servicedb_domain::error::{ServiceDbError, ValidationError};
use servicedb_domain::message::MessageType;

use crate::error::StorageError;
use crate::rows::affected;
use crate::store::{self, SETTINGS};

pub const SETTINGS_FILE_NAME: &str = "settings_v2.db";

struct Wrapper(SettingsEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(SettingsEntry {
            path: row.try_get("path")?,
            value: row.try_get("value")?,
        }))
    }
}

const SELECT_VALUE: &str = "SELECT value FROM settings WHERE path = ?";
const UPSERT: &str =
    "INSERT INTO settings (path, value) VALUES (?, ?) ON CONFLICT(path) DO UPDATE SET value = excluded.value";
const DELETE: &str = "DELETE FROM settings WHERE path = ?";
const SELECT_PREFIX: &str = "SELECT * FROM settings WHERE instr(path, ?) = 1 ORDER BY path";

fn require_path(path: &str) -> Result<(), ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    Ok(())
}

pub struct SettingsAgent {
    path: PathBuf,
    max_connections: u32,
    pool: Option<SqlitePool>,
}

impl SettingsAgent {
    /// Agent backed by `settings_v2.db` under `user_dir`. Nothing is opened
    /// until [`DatabaseAgent::init_db`].
    #[must_use]
    pub fn new(user_dir: &Path, max_connections: u32) -> Self {
        Self {
            path: user_dir.join(SETTINGS_FILE_NAME),
            max_connections,
            pool: None,
        }
    }

    fn pool(&self) -> Result<&SqlitePool, StorageError> {
        self.pool
            .as_ref()
            .ok_or(StorageError::NotOpen(SETTINGS_AGENT_NAME))
    }

    async fn get(&self, path: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar(SELECT_VALUE)
            .bind(path)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(value)
    }

    async fn set(&self, path: &str, value: &str) -> Result<bool, StorageError> {
        sqlx::query(UPSERT)
            .bind(path)
            .bind(value)
            .execute(self.pool()?)
            .await?;
        Ok(true)
    }

    async fn remove(&self, path: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(DELETE)
            .bind(path)
            .execute(self.pool()?)
            .await?;
        Ok(affected(&result))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<SettingsEntry>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PREFIX)
            .bind(prefix)
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn handle_settings(
        &self,
        request: SettingsRequest,
    ) -> Result<AgentResponse, ServiceDbError> {
        let response = match request {
            SettingsRequest::Get { path } => AgentResponse::Value(self.get(&path).await?),
            SettingsRequest::Set { path, value } => {
                require_path(&path)?;
                AgentResponse::Done(self.set(&path, &value).await?)
            }
            SettingsRequest::Remove { path } => AgentResponse::Done(self.remove(&path).await?),
            SettingsRequest::List { prefix } => AgentResponse::Settings(self.list(&prefix).await?),
        };
        Ok(response)
    }
}

#[async_trait]
impl DatabaseAgent for SettingsAgent {
    fn agent_name(&self) -> &'static str {
        SETTINGS_AGENT_NAME
    }

    fn db_file_path(&self) -> &Path {
        &self.path
    }

    async fn init_db(&mut self) -> Result<(), ServiceDbError> {
        let pool = store::connect(&self.path, self.max_connections, &SETTINGS).await?;
        self.pool = Some(pool);
        tracing::info!(path = %self.path.display(), "settings database ready");
        Ok(())
    }

    fn register_messages(&self, registrar: &mut MessageRegistrar<'_>) {
        registrar.connect(MessageType::SettingsGet);
        registrar.connect(MessageType::SettingsSet);
        registrar.connect(MessageType::SettingsRemove);
        registrar.connect(MessageType::SettingsList);
    }

    async fn handle(&self, request: AgentRequest) -> Result<AgentResponse, ServiceDbError> {
        match request {
            AgentRequest::Settings(request) => self.handle_settings(request).await,
            other => Err(ServiceDbError::UnsupportedAgentRequest {
                agent: SETTINGS_AGENT_NAME,
                message: other.message_type(),
            }),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    async fn opened(dir: &Path) -> SettingsAgent {
        let mut agent = SettingsAgent::new(dir, 1);
        agent.init_db().await.unwrap();
        agent
    }

    fn set(path: &str, value: &str) -> AgentRequest {
        AgentRequest::Settings(SettingsRequest::Set {
            path: path.into(),
            value: value.into(),
        })
    }

    #[tokio::test]
    async fn should_overwrite_value_when_setting_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let agent = opened(dir.path()).await;

        agent.handle(set("display/brightness", "3")).await.unwrap();
        agent.handle(set("display/brightness", "5")).await.unwrap();
        let value = agent
            .handle(AgentRequest::Settings(SettingsRequest::Get {
                path: "display/brightness".into(),
            }))
            .await
            .unwrap();

        assert_eq!(value, AgentResponse::Value(Some("5".into())));
    }

    #[tokio::test]
    async fn should_list_only_paths_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let agent = opened(dir.path()).await;
        agent.handle(set("display/brightness", "3")).await.unwrap();
        agent.handle(set("display/timeout", "30")).await.unwrap();
        agent.handle(set("sound/volume", "7")).await.unwrap();

        let listed = agent.list("display/").await.unwrap();

        let paths: Vec<&str> = listed.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["display/brightness", "display/timeout"]);
    }

    #[tokio::test]
    async fn should_treat_like_wildcards_in_prefix_literally() {
        let dir = tempfile::tempdir().unwrap();
        let agent = opened(dir.path()).await;
        agent.handle(set("a_b/x", "1")).await.unwrap();
        agent.handle(set("acb/x", "2")).await.unwrap();

        assert_eq!(agent.list("a_b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        let agent = opened(dir.path()).await;

        let result = agent.handle(set(" ", "1")).await;

        assert!(matches!(
            result,
            Err(ServiceDbError::Validation(ValidationError::EmptyPath))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_used_before_init() {
        let dir = tempfile::tempdir().unwrap();
        let agent = SettingsAgent::new(dir.path(), 1);

        assert!(agent.handle(set("a", "1")).await.is_err());
        assert!(agent.store_into_file(&dir.path().join("copy.db")).await.is_err());
    }

    #[tokio::test]
    async fn should_snapshot_settings_into_target() {
        let dir = tempfile::tempdir().unwrap();
        let agent = opened(dir.path()).await;
        agent.handle(set("sound/volume", "7")).await.unwrap();
        let target = dir.path().join("backup");
        std::fs::create_dir(&target).unwrap();

        agent
            .store_into_file(&target.join(SETTINGS_FILE_NAME))
            .await
            .unwrap();

        let mut copy = SettingsAgent::new(&target, 1);
        copy.init_db().await.unwrap();
        assert_eq!(copy.get("sound/volume").await.unwrap(), Some("7".into()));
    }
}
