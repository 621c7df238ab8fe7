//! Agent registry: who can be routed to, what they do, and who runs them

use super::error::RouterError;
use super::executors::AgentExecutor;
use super::types::AgentKind;
use std::sync::Arc;

/// Where an agent's work is performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEndpoint {
    /// Downstream HTTP agent service
    Http(String),
    /// Answered by the shared language model
    LanguageModel,
}

#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    pub id: String,
    pub endpoint: AgentEndpoint,
    pub description: String,
}

struct RegisteredAgent {
    descriptor: AgentDescriptor,
    executor: Arc<dyn AgentExecutor>,
}

/// Built once at startup, read-only afterwards. Registration order is
/// the order agents are listed to the router model.
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<RegisteredAgent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Register an executor under its kind's id; re-registering replaces in place
    pub fn register(
        &mut self,
        endpoint: AgentEndpoint,
        description: impl Into<String>,
        executor: Arc<dyn AgentExecutor>,
    ) {
        let kind: AgentKind = executor.kind();
        let descriptor = AgentDescriptor {
            id: kind.as_str().to_string(),
            endpoint,
            description: description.into(),
        };

        if let Some(existing) = self.agents.iter_mut().find(|a| a.descriptor.id == descriptor.id) {
            log::warn!("[REGISTRY] Replacing agent '{}'", descriptor.id);
            existing.descriptor = descriptor;
            existing.executor = executor;
            return;
        }

        log::debug!("[REGISTRY] Registered agent '{}'", descriptor.id);
        self.agents.push(RegisteredAgent { descriptor, executor });
    }

    /// `(id, description)` pairs in registration order
    pub fn describe_all(&self) -> Vec<(&str, &str)> {
        self.agents
            .iter()
            .map(|a| (a.descriptor.id.as_str(), a.descriptor.description.as_str()))
            .collect()
    }

    pub fn resolve(&self, id: &str) -> Result<&AgentEndpoint, RouterError> {
        self.descriptor(id)
            .map(|d| &d.endpoint)
            .ok_or_else(|| RouterError::UnknownAgent(id.to_string()))
    }

    pub fn descriptor(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents
            .iter()
            .map(|a| &a.descriptor)
            .find(|d| d.id == id)
    }

    pub fn executor(&self, id: &str) -> Result<Arc<dyn AgentExecutor>, RouterError> {
        self.agents
            .iter()
            .find(|a| a.descriptor.id == id)
            .map(|a| Arc::clone(&a.executor))
            .ok_or_else(|| RouterError::UnknownAgent(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
