//! Router: splits one user message into per-agent tasks
//!
//! The router lists every registered agent to the model and asks for a JSON
//! array of `{"agent_name", "input"}` records. Agent ids are not validated
//! here; anything the model names is passed on, and the scheduler drops ids
//! it has no executor for.

use super::error::RouterError;
use super::registry::AgentRegistry;
use super::types::{RunState, Task};
use crate::ai::LanguageModel;
use async_trait::async_trait;
use std::sync::Arc;

/// Injectable classification step
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, input: &str, registry: &AgentRegistry) -> Result<Vec<Task>, RouterError>;
}

/// Model-backed classifier
pub struct LlmClassifier {
    model: Arc<dyn LanguageModel>,
}

impl LlmClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Classify for LlmClassifier {
    async fn classify(&self, input: &str, registry: &AgentRegistry) -> Result<Vec<Task>, RouterError> {
        let prompt = build_routing_prompt(&registry.describe_all(), input);
        log::debug!("[ROUTER] Prompt:\n{}", prompt);

        let response = self.model.infer(&prompt).await.map_err(RouterError::Model)?;
        log::debug!("[ROUTER] Raw selection:\n{}", response);

        parse_tasks(&response)
    }
}

pub fn build_routing_prompt(agents: &[(&str, &str)], user_input: &str) -> String {
    let agent_list = agents
        .iter()
        .map(|(name, desc)| format!("- {}: {}", name, desc))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an AI assistant that routes user requests to appropriate agents.

Here are the available agents:
{agent_list}

The user may provide a single message that includes multiple requests. Your job is to:
1. Determine which agent(s) should be invoked.
2. Split the message into separate tasks for each relevant agent.

Return your response in the following JSON format:
[
  {{
    "agent_name": "agent_name",
    "input": "the part of the user input relevant to this agent"
  }},
  ...
]

User message: "{user_input}"

Only return valid JSON, no explanations.
"#
    )
}

/// Parse the model's selection. A Markdown code fence around the JSON is tolerated.
pub fn parse_tasks(response: &str) -> Result<Vec<Task>, RouterError> {
    let body = strip_code_fence(response.trim());
    serde_json::from_str::<Vec<Task>>(body)
        .map_err(|e| RouterError::ClassificationParse(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Routing step of a run. A selection the model got wrong leaves the run's
/// task list as it was; a model that could not be reached fails the run.
pub async fn route(
    classifier: &dyn Classify,
    registry: &AgentRegistry,
    state: &mut RunState,
) -> Result<(), RouterError> {
    match classifier.classify(&state.original_input, registry).await {
        Ok(tasks) => {
            log::info!(
                "[ROUTER] Run {} selected {} task(s): [{}]",
                state.short_id(),
                tasks.len(),
                tasks.iter().map(|t| t.agent_id.as_str()).collect::<Vec<_>>().join(", ")
            );
            state.tasks = tasks;
            Ok(())
        }
        Err(RouterError::ClassificationParse(reason)) => {
            log::warn!(
                "[ROUTER] Run {}: model failed to produce an agent selection ({}); keeping {} prior task(s)",
                state.short_id(),
                reason,
                state.tasks.len()
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}
