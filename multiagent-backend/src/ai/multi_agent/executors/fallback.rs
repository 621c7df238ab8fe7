//! Fallback agent: answers from the data sample with the shared model

use super::{settle, AgentExecutor, ExecutionContext};
use crate::ai::multi_agent::error::RouterError;
use crate::ai::multi_agent::types::{AgentKind, AgentResult, Task};
use crate::ai::LanguageModel;
use crate::integrations::TabularSampleReader;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub struct FallbackExecutor {
    model: Arc<dyn LanguageModel>,
    reader: Arc<dyn TabularSampleReader>,
    sample: PathBuf,
}

impl FallbackExecutor {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        reader: Arc<dyn TabularSampleReader>,
        sample: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model,
            reader,
            sample: sample.into(),
        }
    }

    async fn sample_context(&self) -> String {
        let reader = Arc::clone(&self.reader);
        let path = self.sample.clone();
        tokio::task::spawn_blocking(move || reader.read(&path))
            .await
            .unwrap_or_else(|e| format!("Could not read dataset: {}", e))
    }

    async fn answer(&self, task: &Task, context: &ExecutionContext) -> Result<Value, RouterError> {
        let sample = self.sample_context().await;
        let prompt = build_prompt(&sample, context.instructions_for(task));
        let answer = self.model.infer(&prompt).await.map_err(RouterError::Model)?;
        Ok(Value::String(answer))
    }
}

fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "\nYou are a helpful assistant. Use the provided context to answer the user's question.\n\nContext:\n{}\n\nUser:\n{}\n",
        context, question
    )
}

#[async_trait]
impl AgentExecutor for FallbackExecutor {
    fn kind(&self) -> AgentKind {
        AgentKind::Fallback
    }

    async fn execute(&self, task: &Task, context: &ExecutionContext) -> AgentResult {
        log::debug!("[FALLBACK] Run {} starting", context.run_id);
        settle(self.kind(), self.answer(task, context).await)
    }
}
