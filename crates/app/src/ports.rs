//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the service core and the outside world.
//! They are defined here (in `app`) so that both the dispatch layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod agent;
pub mod engine;
pub mod event_bus;
pub mod record_interface;
pub mod record_store;

pub use agent::DatabaseAgent;
pub use engine::{StoreEngine, StoreSet};
pub use event_bus::NotificationPublisher;
pub use record_interface::{
    CalllogInterface, ContactInterface, ContactLookup, LastIdLookup, RecordCrud, RecordInterface,
};
pub use record_store::RecordStore;
