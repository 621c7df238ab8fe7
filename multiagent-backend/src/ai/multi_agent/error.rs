use thiserror::Error;

/// Failures inside the routing core.
///
/// Only `Model` escapes a run. Parse failures are absorbed by the router,
/// unknown agents by the scheduler, and the rest become `AgentResult::Failure`
/// inside the executor that hit them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouterError {
    #[error("could not parse agent selection: {0}")]
    ClassificationParse(String),

    #[error("unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("agent service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("agent service call failed: {0}")]
    Transport(String),

    #[error("could not load data sample: {0}")]
    Sample(String),

    #[error("data preparation plan generation failed: {0}")]
    PlanGeneration(String),

    #[error("could not acquire access token: {0}")]
    Credential(String),

    #[error("timeout")]
    Timeout,

    #[error("model call failed: {0}")]
    Model(String),
}
