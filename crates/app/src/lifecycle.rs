//! Lifecycle controller: brings the engine, stores, interfaces and agents
//! up in a fixed order and takes them down again.

use servicedb_domain::domain_id::StoreKind;
use servicedb_domain::error::ServiceDbError;

use crate::agents::AgentSet;
use crate::ports::{RecordStore, StoreEngine, StoreSet};
use crate::registry::{InterfaceRegistry, RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("store engine failed to initialize")]
    Engine(#[source] ServiceDbError),
    #[error("failed to open the {kind} store")]
    StoreOpen {
        kind: StoreKind,
        #[source]
        source: ServiceDbError,
    },
    #[error("engine opened {0} stores instead of one per kind")]
    StoreCount(usize),
    #[error("interface registry is incomplete")]
    Registry(#[from] RegistryError),
    #[error("agent {name} failed to initialize")]
    AgentInit {
        name: &'static str,
        #[source]
        source: ServiceDbError,
    },
    #[error("service is already running")]
    AlreadyRunning,
}

/// Everything the service owns while running.
pub struct ServiceState<S> {
    pub stores: StoreSet<S>,
    pub registry: InterfaceRegistry,
    pub agents: AgentSet,
}

pub struct LifecycleController<E> {
    engine: E,
}

impl<E: StoreEngine> LifecycleController<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Initialise the engine, open every store, wire the interfaces, then
    /// initialise and register the agents.
    ///
    /// On failure everything brought up so far is released again.
    ///
    /// # Errors
    ///
    /// Returns the first [`LifecycleError`] met; the service cannot run.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<ServiceState<E::Store>, LifecycleError> {
        self.engine
            .initialize()
            .await
            .map_err(LifecycleError::Engine)?;

        let stores = match self.open_stores().await {
            Ok(stores) => stores,
            Err(err) => {
                self.engine.deinitialize().await;
                return Err(err);
            }
        };

        let registry = match self.engine.build_interfaces(&stores) {
            Ok(registry) => registry,
            Err(err) => {
                close_stores(&stores).await;
                self.engine.deinitialize().await;
                return Err(err.into());
            }
        };

        let mut agents = AgentSet::default();
        for mut agent in self.engine.create_agents() {
            if let Err(source) = agent.init_db().await {
                let name = agent.agent_name();
                agents.close_all().await;
                drop(registry);
                close_stores(&stores).await;
                self.engine.deinitialize().await;
                return Err(LifecycleError::AgentInit { name, source });
            }
            agents.register(agent);
        }

        tracing::info!(
            interfaces = registry.len(),
            agents = agents.len(),
            "service started"
        );
        Ok(ServiceState {
            stores,
            registry,
            agents,
        })
    }

    /// Close agents, then stores, then the engine.
    #[tracing::instrument(skip_all)]
    pub async fn shutdown(&self, state: ServiceState<E::Store>) {
        let ServiceState {
            stores,
            registry,
            agents,
        } = state;
        agents.close_all().await;
        drop(registry);
        close_stores(&stores).await;
        self.engine.deinitialize().await;
        tracing::info!("service stopped");
    }

    async fn open_stores(&self) -> Result<StoreSet<E::Store>, LifecycleError> {
        let mut opened = Vec::with_capacity(StoreKind::OPEN_ORDER.len());
        for kind in StoreKind::OPEN_ORDER {
            match self.engine.open(kind).await {
                Ok(store) => {
                    tracing::debug!(%kind, path = %store.file_path().display(), "store opened");
                    opened.push(store);
                }
                Err(source) => {
                    for store in opened.iter().rev() {
                        store.close().await;
                    }
                    return Err(LifecycleError::StoreOpen { kind, source });
                }
            }
        }
        <[E::Store; 8]>::try_from(opened)
            .map(StoreSet::from_open_order)
            .map_err(|opened| LifecycleError::StoreCount(opened.len()))
    }
}

async fn close_stores<S: RecordStore>(stores: &StoreSet<S>) {
    for kind in StoreKind::OPEN_ORDER.into_iter().rev() {
        stores.get(kind).close().await;
    }
}
