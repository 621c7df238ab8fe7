//! Agent executors
//!
//! One executor per [`AgentKind`]. An executor owns every failure it can hit
//! (token, sample, transport, HTTP status, plan parsing, model) and reports it
//! as `AgentResult::Failure`, so a failing agent never takes its siblings down.

pub mod data_preparation;
pub mod fallback;
pub mod reconciliation;

pub use data_preparation::DataPreparationExecutor;
pub use fallback::FallbackExecutor;
pub use reconciliation::ReconciliationExecutor;

use super::error::RouterError;
use super::types::{AgentKind, AgentResult, Task};
use async_trait::async_trait;
use serde_json::Value;

/// Read-only context shared by every executor of a run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub run_id: String,
    pub original_input: String,
}

impl ExecutionContext {
    /// The task's slice of the message, or the whole message when the router left it blank
    pub fn instructions_for<'a>(&'a self, task: &'a Task) -> &'a str {
        if task.sub_input.trim().is_empty() {
            &self.original_input
        } else {
            &task.sub_input
        }
    }
}

#[async_trait]
pub trait AgentExecutor: Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Always yields exactly one result
    async fn execute(&self, task: &Task, context: &ExecutionContext) -> AgentResult;
}

/// Fold an executor's internal outcome into the result recorded for its agent
pub(crate) fn settle(kind: AgentKind, outcome: Result<Value, RouterError>) -> AgentResult {
    match outcome {
        Ok(payload) => AgentResult::success(payload),
        Err(e) => {
            log::warn!("[{}] Failed: {}", kind.as_str().to_uppercase(), e);
            AgentResult::failure(e.to_string())
        }
    }
}
