//! Message dispatcher: the single entry point for inbound requests.
//!
//! Every [`Request`] variant has its own arm; requests addressed to other
//! services land in the explicit [`Request::Foreign`] arm and receive an
//! empty acknowledgement.

use std::path::Path;
use std::time::Instant;

use servicedb_domain::agent::AgentRequest;
use servicedb_domain::calllog::CalllogRecord;
use servicedb_domain::contact::ContactRecord;
use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::message::{MessageType, Payload, Request, Response};
use servicedb_domain::notification::OperationKind;
use servicedb_domain::query::Query;

use crate::backup::BackupCoordinator;
use crate::fanout::NotificationFanout;
use crate::lifecycle::ServiceState;
use crate::ports::{NotificationPublisher, RecordStore};

/// Log a failed operation and keep the value of a successful one.
fn settle<T>(tag: MessageType, result: Result<T, ServiceDbError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(%tag, error = %err, "operation failed");
            None
        }
    }
}

pub struct MessageDispatcher<P> {
    fanout: NotificationFanout<P>,
    backup: BackupCoordinator,
}

impl<P: NotificationPublisher + Send + Sync> MessageDispatcher<P> {
    pub fn new(fanout: NotificationFanout<P>) -> Self {
        Self {
            fanout,
            backup: BackupCoordinator::default(),
        }
    }

    #[must_use]
    pub fn with_backup(mut self, backup: BackupCoordinator) -> Self {
        self.backup = backup;
        self
    }

    /// Handle one request and build its response.
    #[tracing::instrument(skip_all, fields(message = %request.message_type()))]
    pub async fn dispatch<S: RecordStore>(
        &self,
        state: &ServiceState<S>,
        request: Request,
    ) -> Response {
        let started = Instant::now();
        let tag = request.message_type();
        let response = match request {
            Request::ContactAdd(record) => self.contact_add(state, tag, &record).await,
            Request::ContactGetById { id, with_temporary } => {
                Self::contact_get_by_id(state, tag, id, with_temporary).await
            }
            Request::ContactGetBySpeedDial(speed_dial) => {
                let found = state.registry.contacts().get_by_speed_dial(&speed_dial).await;
                match settle(tag, found) {
                    Some(records) => Response::new(tag, true, Payload::Contacts(records)),
                    None => Response::flag(tag, false),
                }
            }
            Request::ContactMatchByNumber(number) => {
                let found = state.registry.contacts().match_by_number(&number).await;
                let contact = settle(tag, found).flatten();
                Response::new(tag, contact.is_some(), Payload::Contact(contact))
            }
            Request::ContactRemove(id) => {
                let removed = state.registry.contacts().remove_by_id(id).await;
                self.finish_mutation(tag, DomainId::Contact, OperationKind::Delete, removed)
                    .await
            }
            Request::ContactUpdate(record) => {
                let updated = state.registry.contacts().update(&record).await;
                self.finish_mutation(tag, DomainId::Contact, OperationKind::Update, updated)
                    .await
            }
            Request::CalllogAdd(record) => self.calllog_add(state, tag, record).await,
            Request::CalllogRemove(id) => {
                let removed = state.registry.calllog().remove_by_id(id).await;
                self.finish_mutation(tag, DomainId::Calllog, OperationKind::Delete, removed)
                    .await
            }
            Request::CalllogUpdate(record) => {
                let updated = state.registry.calllog().update(&record).await;
                self.finish_mutation(tag, DomainId::Calllog, OperationKind::Update, updated)
                    .await
            }
            Request::Query(query) => self.run_query(state, tag, query).await,
            Request::Backup { path } => self.backup(state, tag, &path).await,
            Request::Agent(request) => Self::forward_to_agent(state, tag, request).await,
            Request::Foreign { .. } => Response::acknowledge(tag),
        };
        tracing::debug!(
            success = response.success,
            elapsed_us = started.elapsed().as_micros(),
            "message handled"
        );
        response
    }

    async fn finish_mutation(
        &self,
        tag: MessageType,
        domain: DomainId,
        kind: OperationKind,
        result: Result<bool, ServiceDbError>,
    ) -> Response {
        let success = settle(tag, result).unwrap_or(false);
        self.fanout.notify(domain, kind, success).await;
        Response::flag(tag, success)
    }

    async fn contact_add<S>(
        &self,
        state: &ServiceState<S>,
        tag: MessageType,
        record: &ContactRecord,
    ) -> Response {
        let added = state.registry.contacts().add(record).await;
        let success = settle(tag, added).is_some();
        self.fanout
            .notify(DomainId::Contact, OperationKind::Create, success)
            .await;
        Response::flag(tag, success)
    }

    async fn contact_get_by_id<S>(
        state: &ServiceState<S>,
        tag: MessageType,
        id: RecordId,
        with_temporary: bool,
    ) -> Response {
        let contacts = state.registry.contacts();
        let found = if with_temporary {
            contacts.get_by_id_with_temporary(id).await
        } else {
            contacts.get_by_id(id).await
        };
        match settle(tag, found).flatten() {
            Some(record) => Response::new(tag, true, Payload::Contacts(vec![record])),
            None => Response::new(tag, false, Payload::Contacts(Vec::new())),
        }
    }

    /// Store the call with a fresh identity and answer with the stored
    /// record, as re-read through the last assigned identity.
    async fn calllog_add<S>(
        &self,
        state: &ServiceState<S>,
        tag: MessageType,
        mut record: CalllogRecord,
    ) -> Response {
        let calllog = state.registry.calllog();
        record.id = RecordId::NONE;
        let success = settle(tag, calllog.add(&record).await).is_some();
        if success {
            let stored = match calllog.get_last_id().await {
                Ok(last) => calllog.get_by_id(last).await,
                Err(err) => Err(err),
            };
            if let Some(Some(stored)) = settle(tag, stored) {
                record = stored;
            }
        }
        tracing::info!(id = %record.id, "call logged");
        self.fanout
            .notify(DomainId::Calllog, OperationKind::Create, success)
            .await;
        Response::new(tag, success, Payload::Calls(vec![record]))
    }

    async fn run_query<S>(&self, state: &ServiceState<S>, tag: MessageType, query: Query) -> Response {
        let domain = query.domain();
        let kind = query.kind();
        let name = query.name();
        let Some(interface) = state.registry.get_interface(domain) else {
            tracing::error!(
                error = %ServiceDbError::InterfaceMissing(domain),
                query = name,
                "query dropped"
            );
            return Response::flag(tag, false);
        };
        let outcome = settle(tag, interface.run_query(query).await);
        self.fanout.notify(domain, kind, outcome.is_some()).await;
        match outcome {
            Some(result) => Response::new(
                tag,
                true,
                Payload::Query {
                    query: name.to_owned(),
                    kind,
                    result,
                },
            ),
            None => Response::flag(tag, false),
        }
    }

    async fn backup<S: RecordStore>(
        &self,
        state: &ServiceState<S>,
        tag: MessageType,
        path: &Path,
    ) -> Response {
        match self.backup.backup(&state.stores, &state.agents, path).await {
            Ok(()) => Response::flag(tag, true),
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "backup failed");
                Response::flag(tag, false)
            }
        }
    }

    async fn forward_to_agent<S>(
        state: &ServiceState<S>,
        tag: MessageType,
        request: AgentRequest,
    ) -> Response {
        let Some(agent) = state.agents.route(tag) else {
            tracing::debug!(%tag, "no agent connected to message");
            return Response::acknowledge(tag);
        };
        match settle(tag, agent.handle(request).await) {
            Some(answer) => Response::new(tag, true, Payload::Agent(answer)),
            None => Response::flag(tag, false),
        }
    }
}
