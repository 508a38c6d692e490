//! Agent set: the service's database agents and the message routes they
//! claimed.

use std::collections::HashMap;

use servicedb_domain::message::MessageType;

use crate::ports::DatabaseAgent;

/// Handed to [`DatabaseAgent::register_messages`]; routes claimed tags to the
/// registering agent.
pub struct MessageRegistrar<'a> {
    routes: &'a mut HashMap<MessageType, usize>,
    index: usize,
    agent: &'static str,
}

impl MessageRegistrar<'_> {
    /// Route requests tagged `message_type` to the registering agent. The
    /// first agent to claim a tag keeps it.
    pub fn connect(&mut self, message_type: MessageType) {
        if let Some(owner) = self.routes.get(&message_type) {
            tracing::warn!(
                agent = self.agent,
                owner,
                %message_type,
                "message already routed to another agent"
            );
            return;
        }
        self.routes.insert(message_type, self.index);
    }
}

/// Agents in registration order.
#[derive(Default)]
pub struct AgentSet {
    agents: Vec<Box<dyn DatabaseAgent>>,
    routes: HashMap<MessageType, usize>,
}

impl AgentSet {
    /// Add an initialised agent and let it claim its message tags.
    pub fn register(&mut self, agent: Box<dyn DatabaseAgent>) {
        let mut registrar = MessageRegistrar {
            routes: &mut self.routes,
            index: self.agents.len(),
            agent: agent.agent_name(),
        };
        agent.register_messages(&mut registrar);
        tracing::debug!(agent = agent.agent_name(), "agent registered");
        self.agents.push(agent);
    }

    /// Agent serving `message_type`, if one claimed it.
    #[must_use]
    pub fn route(&self, message_type: MessageType) -> Option<&dyn DatabaseAgent> {
        self.routes
            .get(&message_type)
            .and_then(|index| self.agents.get(*index))
            .map(AsRef::as_ref)
    }

    /// Agent called `name`, if registered.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&dyn DatabaseAgent> {
        self.agents
            .iter()
            .find(|agent| agent.agent_name() == name)
            .map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DatabaseAgent> {
        self.agents.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Close agents in reverse registration order.
    pub async fn close_all(&self) {
        for agent in self.agents.iter().rev() {
            agent.close().await;
            tracing::debug!(agent = agent.agent_name(), "agent closed");
        }
    }
}
