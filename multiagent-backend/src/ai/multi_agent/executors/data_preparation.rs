//! Data preparation agent
//!
//! Two calls against the preparation service: generate a plan from the sample
//! and the user's instructions, then execute that plan on the same sample.
//! Nothing is executed unless a plan came back.

use super::{settle, AgentExecutor, ExecutionContext};
use crate::ai::multi_agent::error::RouterError;
use crate::ai::multi_agent::types::{AgentKind, AgentResult, Task};
use crate::auth::TokenProvider;
use crate::integrations::samples::load_sample;
use crate::integrations::{AgentHttpClient, AgentRequest, AgentResponse, SampleOpener};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Declared column types of the demo sample
const DATA_TYPES: &str = r#"["DATE","TEXT","TEXT"]"#;
const PLAN_FIELD: &str = "dataPreparationPlan";

pub struct DataPreparationExecutor {
    plan_endpoint: String,
    execute_endpoint: String,
    sample: PathBuf,
    tokens: Arc<dyn TokenProvider>,
    http: Arc<dyn AgentHttpClient>,
    opener: Arc<dyn SampleOpener>,
}

impl DataPreparationExecutor {
    pub fn new(
        plan_endpoint: impl Into<String>,
        execute_endpoint: impl Into<String>,
        sample: impl Into<PathBuf>,
        tokens: Arc<dyn TokenProvider>,
        http: Arc<dyn AgentHttpClient>,
        opener: Arc<dyn SampleOpener>,
    ) -> Self {
        Self {
            plan_endpoint: plan_endpoint.into(),
            execute_endpoint: execute_endpoint.into(),
            sample: sample.into(),
            tokens,
            http,
            opener,
        }
    }

    async fn generate_plan(&self, token: &str, instructions: &str) -> Result<Value, RouterError> {
        let sample = load_sample(Arc::clone(&self.opener), self.sample.clone(), "dataSample")
            .await
            .map_err(RouterError::Sample)?;

        let request = AgentRequest::new(&self.plan_endpoint)
            .file(sample)
            .field("dataTypes", DATA_TYPES)
            .field("userPrompt", instructions)
            .bearer(token);

        log::info!("[DATA_PREP] Requesting preparation plan from {}", self.plan_endpoint);

        let response = self
            .http
            .submit(request)
            .await
            .map_err(RouterError::PlanGeneration)?;
        if !response.is_success() {
            return Err(RouterError::PlanGeneration(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }

        extract_plan(&response)
    }

    async fn execute_plan(&self, token: &str, plan: &Value) -> Result<Value, RouterError> {
        let sample = load_sample(Arc::clone(&self.opener), self.sample.clone(), "dataToPrepareAsCsv")
            .await
            .map_err(RouterError::Sample)?;

        let request = AgentRequest::new(&self.execute_endpoint)
            .file(sample)
            .field("dataTypes", DATA_TYPES)
            .field(PLAN_FIELD, plan.to_string())
            .bearer(token);

        log::info!("[DATA_PREP] Executing preparation plan at {}", self.execute_endpoint);

        let response = self.http.submit(request).await.map_err(RouterError::Transport)?;
        if !response.is_success() {
            return Err(RouterError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        Ok(Value::String(response.body))
    }

    async fn prepare(&self, task: &Task, context: &ExecutionContext) -> Result<Value, RouterError> {
        let token = self.tokens.acquire().await.map_err(RouterError::Credential)?;
        let plan = self.generate_plan(&token, context.instructions_for(task)).await?;
        self.execute_plan(&token, &plan).await
    }
}

/// The plan sits under `result`, either as an object or as a JSON-encoded string
fn extract_plan(response: &AgentResponse) -> Result<Value, RouterError> {
    let document = match response.result_or_text() {
        Value::String(text) => serde_json::from_str::<Value>(&text)
            .map_err(|e| RouterError::PlanGeneration(format!("plan response is not JSON: {}", e)))?,
        other => other,
    };

    document
        .get(PLAN_FIELD)
        .cloned()
        .ok_or_else(|| RouterError::PlanGeneration(format!("response has no '{}'", PLAN_FIELD)))
}

#[async_trait]
impl AgentExecutor for DataPreparationExecutor {
    fn kind(&self) -> AgentKind {
        AgentKind::DataPreparation
    }

    async fn execute(&self, task: &Task, context: &ExecutionContext) -> AgentResult {
        log::debug!("[DATA_PREP] Run {} starting", context.run_id);
        settle(self.kind(), self.prepare(task, context).await)
    }
}
