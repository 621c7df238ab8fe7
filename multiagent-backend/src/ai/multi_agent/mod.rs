//! Multi-agent routing core
//!
//! A single user message can ask several specialised agents for work at once.
//! This module decides who gets what and collects the answers:
//!
//! 1. **Route** - the language model splits the message into per-agent tasks
//! 2. **Dispatch** - each task whose agent is registered runs on its executor,
//!    all of them concurrently and each under a timeout
//! 3. **Join** - every executor's result lands in the run's aggregate under
//!    its agent id
//!
//! ## Flow
//!
//! ```text
//!            ┌→ reconciliation ───┐
//! Request → Route → data_preparation → Join → Aggregate
//!            └→ fallback ─────────┘
//! ```
//!
//! ## Failure handling
//!
//! - Unparseable model selection: run continues with no tasks
//! - Unknown agent id: task skipped at dispatch
//! - Agent failure or timeout: recorded as that agent's entry
//! - Router model unreachable: run fails

pub mod classifier;
pub mod error;
pub mod executors;
pub mod orchestrator;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::LlmClassifier;
pub use orchestrator::Orchestrator;
pub use registry::{AgentEndpoint, AgentRegistry};

use crate::ai::LanguageModel;
use crate::auth::TokenProvider;
use crate::config::Config;
use crate::integrations::{AgentHttpClient, SampleOpener, TabularSampleReader};
use executors::{DataPreparationExecutor, FallbackExecutor, ReconciliationExecutor};
use std::sync::Arc;

pub const RECONCILIATION_DESCRIPTION: &str =
    "Compares two sets of financial transaction data and finds matches or mismatches.";
pub const DATA_PREPARATION_DESCRIPTION: &str =
    "Handles data cleaning and preparation tasks to ensure the dataset is ready for downstream processing.";
pub const FALLBACK_DESCRIPTION: &str =
    "This can be used to answer questions around the dataset we are to provide, or any kind of casual questions or when no agent is suitable";

/// External collaborators the built-in agents are wired to
#[derive(Clone)]
pub struct AgentDependencies {
    pub model: Arc<dyn LanguageModel>,
    pub tokens: Arc<dyn TokenProvider>,
    pub http: Arc<dyn AgentHttpClient>,
    pub opener: Arc<dyn SampleOpener>,
    pub reader: Arc<dyn TabularSampleReader>,
}

/// Register all built-in agents
fn register_all_agents(registry: &mut AgentRegistry, config: &Config, deps: &AgentDependencies) {
    registry.register(
        AgentEndpoint::Http(config.agents.reconciliation_url.clone()),
        RECONCILIATION_DESCRIPTION,
        Arc::new(ReconciliationExecutor::new(
            &config.agents.reconciliation_url,
            &config.agents.reconciliation_api_version,
            &config.samples.primary,
            &config.samples.secondary,
            Arc::clone(&deps.tokens),
            Arc::clone(&deps.http),
            Arc::clone(&deps.opener),
        )),
    );

    registry.register(
        AgentEndpoint::Http(config.agents.data_preparation_url.clone()),
        DATA_PREPARATION_DESCRIPTION,
        Arc::new(DataPreparationExecutor::new(
            &config.agents.data_preparation_plan_url,
            &config.agents.data_preparation_url,
            &config.samples.primary,
            Arc::clone(&deps.tokens),
            Arc::clone(&deps.http),
            Arc::clone(&deps.opener),
        )),
    );

    registry.register(
        AgentEndpoint::LanguageModel,
        FALLBACK_DESCRIPTION,
        Arc::new(FallbackExecutor::new(
            Arc::clone(&deps.model),
            Arc::clone(&deps.reader),
            &config.samples.primary,
        )),
    );
}

/// Create a registry with every built-in agent registered
pub fn create_default_registry(config: &Config, deps: &AgentDependencies) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    register_all_agents(&mut registry, config, deps);
    registry
}
