//! # servicedb-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`StoreEngine`](servicedb_app::ports::StoreEngine) port:
//!   one database file per store, embedded migrations per store
//! - Implement one record interface per domain over those stores
//! - Implement the settings and file indexer database agents
//! - Map between domain records and database rows
//!
//! ## Dependency rule
//! Depends on `servicedb-app` (for port traits) and `servicedb-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

pub mod alarms;
pub mod calllog;
pub mod contacts;
pub mod country_codes;
pub mod engine;
pub mod error;
pub mod file_indexer_agent;
pub mod notes;
pub mod notifications;
pub mod quotes;
mod rows;
pub mod settings_agent;
pub mod sms;
pub mod sms_templates;
pub mod store;
pub mod threads;

pub use engine::{EngineConfig, SqliteEngine};
pub use error::StorageError;
