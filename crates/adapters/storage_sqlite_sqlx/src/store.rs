//! `SQLite` record store: one database file per [`StoreKind`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use servicedb_app::ports::RecordStore;
use servicedb_domain::domain_id::StoreKind;
use servicedb_domain::error::ServiceDbError;

use crate::error::StorageError;

static CONTACTS: Migrator = sqlx::migrate!("./migrations/contacts");
static SMS: Migrator = sqlx::migrate!("./migrations/sms");
static ALARMS: Migrator = sqlx::migrate!("./migrations/alarms");
static NOTES: Migrator = sqlx::migrate!("./migrations/notes");
static CALLLOG: Migrator = sqlx::migrate!("./migrations/calllog");
static COUNTRY_CODES: Migrator = sqlx::migrate!("./migrations/country_codes");
static NOTIFICATIONS: Migrator = sqlx::migrate!("./migrations/notifications");
static QUOTES: Migrator = sqlx::migrate!("./migrations/quotes");

pub(crate) static SETTINGS: Migrator = sqlx::migrate!("./migrations/settings");
pub(crate) static FILE_INDEXER: Migrator = sqlx::migrate!("./migrations/file_indexer");

fn migrator(kind: StoreKind) -> &'static Migrator {
    match kind {
        StoreKind::Contacts => &CONTACTS,
        StoreKind::Sms => &SMS,
        StoreKind::Alarms => &ALARMS,
        StoreKind::Notes => &NOTES,
        StoreKind::Calllog => &CALLLOG,
        StoreKind::CountryCodes => &COUNTRY_CODES,
        StoreKind::Notifications => &NOTIFICATIONS,
        StoreKind::Quotes => &QUOTES,
    }
}

/// Open (creating if missing) the database at `path` and run `migrator`.
pub(crate) async fn connect(
    path: &Path,
    max_connections: u32,
    migrator: &Migrator,
) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    migrator.run(&pool).await?;
    Ok(pool)
}

/// Open an existing database at `path` without write access. No migration
/// runs, the file is expected to ship fully seeded.
pub(crate) async fn connect_read_only(
    path: &Path,
    max_connections: u32,
) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Write a consistent copy of the database behind `pool` to `target`.
///
/// A regular file already at `target` is replaced. Anything else occupying
/// the name (a directory for instance) makes the snapshot fail.
pub(crate) async fn vacuum_into(pool: &SqlitePool, target: &Path) -> Result<(), StorageError> {
    match tokio::fs::symlink_metadata(target).await {
        Ok(meta) if meta.is_file() => tokio::fs::remove_file(target).await?,
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    sqlx::query("VACUUM INTO ?")
        .bind(target.to_string_lossy().into_owned())
        .execute(pool)
        .await?;
    Ok(())
}

/// An opened store. Record interfaces get clones of its pool; closing the
/// store closes them too.
pub struct SqliteStore {
    kind: StoreKind,
    path: PathBuf,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the store of `kind` backed by `path`.
    ///
    /// Asset stores are opened read-only when their file exists. A missing
    /// asset is created and seeded, which only happens on development setups.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be opened or migrated.
    pub async fn open(
        kind: StoreKind,
        path: PathBuf,
        max_connections: u32,
    ) -> Result<Self, StorageError> {
        let shipped = kind.is_asset() && tokio::fs::try_exists(&path).await?;
        let pool = if shipped {
            tracing::debug!(store = %kind, path = %path.display(), "opening asset read-only");
            connect_read_only(&path, max_connections).await?
        } else {
            connect(&path, max_connections, migrator(kind)).await?
        };
        Ok(Self { kind, path, pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    fn file_path(&self) -> &Path {
        &self.path
    }

    async fn store_into_file(&self, target: &Path) -> Result<(), ServiceDbError> {
        vacuum_into(&self.pool, target).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
