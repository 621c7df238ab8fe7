//! Multi-agent orchestrator - routes a request, fans out to agents, joins their results

use super::classifier::{self, Classify};
use super::error::RouterError;
use super::executors::{AgentExecutor, ExecutionContext};
use super::registry::AgentRegistry;
use super::types::{AgentResult, RunPhase, RunState, Task};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Default per-executor budget when none is configured
pub const DEFAULT_EXECUTOR_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs requests through Routing → Dispatched → Joined
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    classifier: Arc<dyn Classify>,
    executor_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, classifier: Arc<dyn Classify>) -> Self {
        Self {
            registry,
            classifier,
            executor_timeout: DEFAULT_EXECUTOR_TIMEOUT,
        }
    }

    pub fn with_executor_timeout(mut self, timeout: Duration) -> Self {
        self.executor_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Process one request end to end. Agent failures end up inside the
    /// returned state; only a failing router model is an `Err`.
    pub async fn run(&self, input: &str) -> Result<RunState, RouterError> {
        let mut state = RunState::new(input);
        log::info!("[ORCHESTRATOR] Run {} started", state.short_id());

        classifier::route(self.classifier.as_ref(), &self.registry, &mut state).await?;

        let dispatch = self.plan_dispatch(&state);
        state.advance(RunPhase::Dispatched);

        let context = ExecutionContext {
            run_id: state.run_id.clone(),
            original_input: state.original_input.clone(),
        };
        let results = self.execute_all(dispatch, context).await;

        for (agent_id, result) in results {
            state.record(&agent_id, result);
        }
        state.advance(RunPhase::Joined);

        if let Some(outputs) = state.outputs() {
            let failed = outputs.values().filter(|r| !r.is_success()).count();
            log::info!(
                "[ORCHESTRATOR] Run {} joined: {} result(s), {} failed",
                state.short_id(),
                outputs.len(),
                failed
            );
        }

        Ok(state)
    }

    /// Pair each task with its executor. Unknown agents and repeat tasks
    /// for an agent already scheduled are dropped here.
    fn plan_dispatch(&self, state: &RunState) -> Vec<(Task, Arc<dyn AgentExecutor>)> {
        let mut scheduled = HashSet::new();
        let mut dispatch = Vec::new();

        for task in &state.tasks {
            let executor = match self.registry.executor(&task.agent_id) {
                Ok(executor) => executor,
                Err(e) => {
                    log::warn!("[ORCHESTRATOR] Run {}: skipping task ({})", state.short_id(), e);
                    continue;
                }
            };
            if !scheduled.insert(task.agent_id.clone()) {
                log::warn!(
                    "[ORCHESTRATOR] Run {}: '{}' already scheduled, dropping repeat task",
                    state.short_id(),
                    task.agent_id
                );
                continue;
            }
            dispatch.push((task.clone(), executor));
        }

        dispatch
    }

    /// Run every dispatched executor concurrently, each on its own task and
    /// under the executor timeout, and wait for all of them.
    async fn execute_all(
        &self,
        dispatch: Vec<(Task, Arc<dyn AgentExecutor>)>,
        context: ExecutionContext,
    ) -> Vec<(String, AgentResult)> {
        let agent_ids: Vec<String> = dispatch.iter().map(|(t, _)| t.agent_id.clone()).collect();

        let handles = dispatch.into_iter().map(|(task, executor)| {
            let context = context.clone();
            let timeout = self.executor_timeout;
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, executor.execute(&task, &context)).await {
                    Ok(result) => result,
                    Err(_) => {
                        log::warn!(
                            "[ORCHESTRATOR] '{}' timed out after {:?}",
                            task.agent_id,
                            timeout
                        );
                        AgentResult::failure(RouterError::Timeout.to_string())
                    }
                }
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .zip(agent_ids)
            .map(|(joined, agent_id)| {
                let result = joined.unwrap_or_else(|e| {
                    log::error!("[ORCHESTRATOR] '{}' executor aborted: {}", agent_id, e);
                    AgentResult::failure(format!("executor aborted: {}", e))
                });
                (agent_id, result)
            })
            .collect()
    }
}
