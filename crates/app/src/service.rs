//! The service actor: one task owning every store, interface and agent.
//!
//! All messages are handled one at a time on that task, so nothing inside
//! the service needs a lock. [`ServiceHandle`] is the mailbox side.

use std::fmt;

use servicedb_domain::message::{Request, Response};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::dispatcher::MessageDispatcher;
use crate::fanout::{NotificationFanout, NotificationPolicy};
use crate::lifecycle::{LifecycleController, LifecycleError, ServiceState};
use crate::ports::{NotificationPublisher, StoreEngine};

/// Mailbox capacity used when none is configured.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service mailbox is closed")]
    MailboxClosed,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Why the system asks the service to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    RegularPowerDown,
    Reboot,
    FactoryReset,
    LowBattery,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PowerMode {
    #[default]
    Active,
    SuspendToRam,
    SuspendToNvm,
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub mailbox_capacity: usize,
    pub policy: NotificationPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            policy: NotificationPolicy::default(),
        }
    }
}

enum Command {
    Init {
        reply: oneshot::Sender<Result<(), LifecycleError>>,
    },
    Deinit {
        reply: oneshot::Sender<()>,
    },
    Close {
        reason: CloseReason,
        reply: oneshot::Sender<()>,
    },
    SwitchPowerMode {
        mode: PowerMode,
        reply: oneshot::Sender<()>,
    },
    Request {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
}

/// Cloneable sender side of the service mailbox.
#[derive(Clone)]
pub struct ServiceHandle {
    mailbox: mpsc::Sender<Command>,
}

impl ServiceHandle {
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, answer) = oneshot::channel();
        self.mailbox
            .send(command(reply))
            .await
            .map_err(|_| ServiceError::MailboxClosed)?;
        answer.await.map_err(|_| ServiceError::MailboxClosed)
    }

    /// Bring up the engine, stores, interfaces and agents.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Lifecycle`] when startup fails; the service
    /// keeps answering requests with failures.
    pub async fn init(&self) -> Result<(), ServiceError> {
        self.call(|reply| Command::Init { reply }).await??;
        Ok(())
    }

    /// Release everything and stop the service task.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MailboxClosed`] when the task already ended.
    pub async fn deinit(&self) -> Result<(), ServiceError> {
        self.call(|reply| Command::Deinit { reply }).await
    }

    /// Resolves once the service is ready to be closed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MailboxClosed`] when the task already ended.
    pub async fn close(&self, reason: CloseReason) -> Result<(), ServiceError> {
        self.call(|reply| Command::Close { reason, reply }).await
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::MailboxClosed`] when the task already ended.
    pub async fn switch_power_mode(&self, mode: PowerMode) -> Result<(), ServiceError> {
        self.call(|reply| Command::SwitchPowerMode { mode, reply })
            .await
    }

    /// Send a request and wait for its response. A stopped service answers
    /// with a failure.
    pub async fn request(&self, request: Request) -> Response {
        let tag = request.message_type();
        match self.call(|reply| Command::Request { request, reply }).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%tag, error = %err, "request not delivered");
                Response::flag(tag, false)
            }
        }
    }
}

/// The service actor.
pub struct ServiceDb<E: StoreEngine, P> {
    controller: LifecycleController<E>,
    dispatcher: MessageDispatcher<P>,
    state: Option<ServiceState<E::Store>>,
    power_mode: PowerMode,
    mailbox: mpsc::Receiver<Command>,
}

impl<E, P> ServiceDb<E, P>
where
    E: StoreEngine + 'static,
    P: NotificationPublisher + Send + Sync + 'static,
{
    /// Spawn the service task. It stays idle until [`ServiceHandle::init`].
    pub fn spawn(engine: E, publisher: P, config: ServiceConfig) -> (ServiceHandle, JoinHandle<()>) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_capacity.max(1));
        let service = Self {
            controller: LifecycleController::new(engine),
            dispatcher: MessageDispatcher::new(NotificationFanout::new(publisher, config.policy)),
            state: None,
            power_mode: PowerMode::default(),
            mailbox,
        };
        let task = tokio::spawn(service.run());
        (ServiceHandle { mailbox: sender }, task)
    }

    async fn run(mut self) {
        tracing::debug!("service task started");
        while let Some(command) = self.mailbox.recv().await {
            match command {
                Command::Init { reply } => {
                    let result = self.init().await;
                    let _ = reply.send(result);
                }
                Command::Deinit { reply } => {
                    self.stop().await;
                    let _ = reply.send(());
                    break;
                }
                Command::Close { reason, reply } => {
                    tracing::info!(?reason, "close requested, ready to close");
                    let _ = reply.send(());
                }
                Command::SwitchPowerMode { mode, reply } => {
                    tracing::info!(from = %self.power_mode, to = %mode, "power mode switched");
                    self.power_mode = mode;
                    let _ = reply.send(());
                }
                Command::Request { request, reply } => {
                    let response = match &self.state {
                        Some(state) => self.dispatcher.dispatch(state, request).await,
                        None => {
                            tracing::warn!(
                                message = %request.message_type(),
                                "request received while not running"
                            );
                            Response::flag(request.message_type(), false)
                        }
                    };
                    let _ = reply.send(response);
                }
            }
        }
        self.stop().await;
        tracing::debug!("service task finished");
    }

    async fn init(&mut self) -> Result<(), LifecycleError> {
        if self.state.is_some() {
            return Err(LifecycleError::AlreadyRunning);
        }
        match self.controller.start().await {
            Ok(state) => {
                self.state = Some(state);
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "service failed to start");
                Err(err)
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(state) = self.state.take() {
            self.controller.shutdown(state).await;
        }
    }
}
