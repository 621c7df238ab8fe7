//! Multi-agent routing types

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The agents this backend can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Reconciliation,
    DataPreparation,
    Fallback,
}

impl AgentKind {
    /// Identifier used in prompts, tasks and the aggregate
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Reconciliation => "reconciliation",
            AgentKind::DataPreparation => "data_preparation",
            AgentKind::Fallback => "fallback",
        }
    }

    #[cfg(test)]
    pub fn all() -> &'static [AgentKind] {
        &[
            AgentKind::Reconciliation,
            AgentKind::DataPreparation,
            AgentKind::Fallback,
        ]
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One agent-specific slice of the user's request, as emitted by the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "agent_name")]
    pub agent_id: String,
    #[serde(rename = "input", default)]
    pub sub_input: String,
}

impl Task {
    #[cfg(test)]
    pub fn new(agent_id: impl Into<String>, sub_input: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            sub_input: sub_input.into(),
        }
    }
}

/// Outcome of one agent invocation
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResult {
    Success(Value),
    Failure(String),
}

impl AgentResult {
    pub fn success(payload: impl Into<Value>) -> Self {
        AgentResult::Success(payload.into())
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        AgentResult::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentResult::Success(_))
    }
}

/// Successes serialize as the bare payload, failures as `{"error": reason}`
impl Serialize for AgentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AgentResult::Success(payload) => payload.serialize(serializer),
            AgentResult::Failure(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", reason)?;
                map.end()
            }
        }
    }
}

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Routing,
    Dispatched,
    Joined,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Routing => write!(f, "routing"),
            RunPhase::Dispatched => write!(f, "dispatched"),
            RunPhase::Joined => write!(f, "joined"),
        }
    }
}

/// Everything one request accumulates on its way through the router.
/// Owned by a single run; never shared between runs.
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub original_input: String,
    pub tasks: Vec<Task>,
    outputs: BTreeMap<String, AgentResult>,
    phase: RunPhase,
}

impl RunState {
    pub fn new(original_input: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            original_input: original_input.into(),
            tasks: Vec::new(),
            outputs: BTreeMap::new(),
            phase: RunPhase::Routing,
        }
    }

    pub(super) fn advance(&mut self, next: RunPhase) {
        log::debug!("[SCHEDULER] Run {} {} → {}", self.short_id(), self.phase, next);
        self.phase = next;
    }

    /// Record an agent's result. Refuses agents that were never tasked and
    /// never overwrites an existing entry.
    pub fn record(&mut self, agent_id: &str, result: AgentResult) -> bool {
        if !self.tasks.iter().any(|t| t.agent_id == agent_id) {
            log::warn!(
                "[SCHEDULER] Refusing result for '{}': agent was not selected for this run",
                agent_id
            );
            return false;
        }
        if self.outputs.contains_key(agent_id) {
            log::warn!("[SCHEDULER] Duplicate result for '{}' ignored", agent_id);
            return false;
        }
        self.outputs.insert(agent_id.to_string(), result);
        true
    }

    /// The aggregate; only exposed once the run has joined
    pub fn outputs(&self) -> Option<&BTreeMap<String, AgentResult>> {
        (self.phase == RunPhase::Joined).then_some(&self.outputs)
    }

    pub fn into_outputs(self) -> BTreeMap<String, AgentResult> {
        self.outputs
    }

    pub fn short_id(&self) -> &str {
        &self.run_id[..8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_kind_names() {
        let names: Vec<String> = AgentKind::all().iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["reconciliation", "data_preparation", "fallback"]);
    }

    #[test]
    fn test_task_wire_names() {
        let task: Task = serde_json::from_value(json!({"agent_name": "fallback", "input": "hi"})).unwrap();
        assert_eq!(task, Task::new("fallback", "hi"));

        let task: Task = serde_json::from_value(json!({"agent_name": "fallback"})).unwrap();
        assert_eq!(task.sub_input, "");
    }

    #[test]
    fn test_result_serialization() {
        assert_eq!(serde_json::to_value(AgentResult::success("MATCHED")).unwrap(), json!("MATCHED"));
        assert_eq!(
            serde_json::to_value(AgentResult::failure("timeout")).unwrap(),
            json!({"error": "timeout"})
        );
    }

    #[test]
    fn test_record_only_tasked_agents_once() {
        let mut state = RunState::new("hello");
        state.tasks = vec![Task::new("fallback", "hello")];

        assert!(!state.record("reconciliation", AgentResult::success("x")));
        assert!(state.record("fallback", AgentResult::success("first")));
        assert!(!state.record("fallback", AgentResult::success("second")));

        state.advance(RunPhase::Dispatched);
        assert!(state.outputs().is_none());
        state.advance(RunPhase::Joined);

        let outputs = state.outputs().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs["fallback"], AgentResult::success("first"));
    }
}
