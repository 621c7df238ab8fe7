use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CORS_ORIGINS: &str = "https://localhost:3000,http://localhost:8080,https://127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,
    pub openai: OpenAIConfig,
    pub agents: AgentEndpoints,
    pub samples: SamplePaths,
    pub token_config_path: PathBuf,
    /// Static bearer token; skips the password grant when set
    pub agent_access_token: Option<String>,
    /// Accept self-signed certificates from the agent services
    pub agent_tls_insecure: bool,
    pub executor_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

#[derive(Clone, Debug)]
pub struct AgentEndpoints {
    pub reconciliation_url: String,
    pub reconciliation_api_version: String,
    pub data_preparation_url: String,
    pub data_preparation_plan_url: String,
}

#[derive(Clone, Debug)]
pub struct SamplePaths {
    pub primary: PathBuf,
    pub secondary: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            bind_address: env_or("BIND_ADDRESS", "0.0.0.0"),
            cors_allowed_origins: parse_origins(&env_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS)),
            openai: OpenAIConfig {
                api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                endpoint: env_or("OPENAI_ENDPOINT", "https://api.openai.com/v1/chat/completions"),
                deployment: env_or("OPENAI_DEPLOYMENT", "gpt-4o"),
                api_version: env_or("OPENAI_API_VERSION", "2024-12-01-preview"),
            },
            agents: AgentEndpoints {
                reconciliation_url: env_or(
                    "RECONCILIATION_URL",
                    "https://localhost:4000/api/v1.0/Reconciliation/PerformReconciliation",
                ),
                reconciliation_api_version: env_or("RECONCILIATION_API_VERSION", "2022-03-01-preview"),
                data_preparation_url: env_or(
                    "DATA_PREPARATION_URL",
                    "https://localhost:4000/api/v2.0/DataPreparationAi/executeDataPreparationPlan",
                ),
                data_preparation_plan_url: env_or(
                    "DATA_PREPARATION_PLAN_URL",
                    "https://localhost:4000/api/v1.0/DataPreparationAi/generateDataPreparationPlan",
                ),
            },
            samples: SamplePaths {
                primary: PathBuf::from(env_or("PRIMARY_SAMPLE_PATH", "DemoData/BaseReconDemoDataPrimary.csv")),
                secondary: PathBuf::from(env_or("SECONDARY_SAMPLE_PATH", "DemoData/BaseReconDemoDataSecondary.csv")),
            },
            token_config_path: PathBuf::from(env_or("TOKEN_CONFIG_PATH", "config.json")),
            agent_access_token: env::var("AGENT_ACCESS_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            agent_tls_insecure: env::var("AGENT_TLS_INSECURE")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            executor_timeout: Duration::from_secs(
                env::var("EXECUTOR_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .expect("EXECUTOR_TIMEOUT_SECS must be a valid number"),
            ),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
