//! # servicedb-app
//!
//! Application layer of the data-access service: port definitions and the
//! logic that sits between the message bus and the record stores.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `RecordStore`: one durable store file with snapshot support
//!   - `RecordInterface` and its capability traits: per-domain operations
//!   - `DatabaseAgent`: non-CRUD units with their own storage
//!   - `StoreEngine`: opens stores, wires interfaces, builds agents
//!   - `NotificationPublisher`: fire-and-forget change events
//! - Provide the **service core**:
//!   - `InterfaceRegistry`: one interface per domain, fixed at startup
//!   - `MessageDispatcher`: routes requests, builds responses, notifies
//!   - `BackupCoordinator`: sequential, fail-fast snapshots
//!   - `LifecycleController`: ordered startup and shutdown
//!   - `ServiceDb`: the single-task actor and its `ServiceHandle`
//! - Provide **in-process infrastructure** (notification bus) that needs no IO
//!
//! ## Dependency rule
//! Depends on `servicedb-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod agents;
pub mod backup;
pub mod dispatcher;
pub mod event_bus;
pub mod fanout;
pub mod lifecycle;
pub mod ports;
pub mod registry;
pub mod service;

#[cfg(test)]
mod fakes;
