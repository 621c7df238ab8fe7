//! Boundaries to the external agent services and the data samples they consume

pub mod agent_http;
pub mod samples;

pub use agent_http::{AgentHttpClient, AgentRequest, AgentResponse, ReqwestAgentClient};
pub use samples::{CsvSampleReader, FsSampleOpener, SampleOpener, TabularSampleReader};
