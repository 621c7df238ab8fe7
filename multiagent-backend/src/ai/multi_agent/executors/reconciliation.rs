//! Reconciliation agent: uploads the primary/secondary sample pair for matching

use super::{settle, AgentExecutor, ExecutionContext};
use crate::ai::multi_agent::error::RouterError;
use crate::ai::multi_agent::types::{AgentKind, AgentResult, Task};
use crate::auth::TokenProvider;
use crate::integrations::samples::load_sample;
use crate::integrations::{AgentHttpClient, AgentRequest, SampleOpener};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Column index where the monetary key columns start
const MONETARY_KEY_START_INDEX: &str = "2";
/// -1 disables partial-column matching
const PARTIAL_COLUMN_INDEX: &str = "-1";

pub struct ReconciliationExecutor {
    endpoint: String,
    api_version: String,
    primary_sample: PathBuf,
    secondary_sample: PathBuf,
    tokens: Arc<dyn TokenProvider>,
    http: Arc<dyn AgentHttpClient>,
    opener: Arc<dyn SampleOpener>,
}

impl ReconciliationExecutor {
    pub fn new(
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
        primary_sample: impl Into<PathBuf>,
        secondary_sample: impl Into<PathBuf>,
        tokens: Arc<dyn TokenProvider>,
        http: Arc<dyn AgentHttpClient>,
        opener: Arc<dyn SampleOpener>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: api_version.into(),
            primary_sample: primary_sample.into(),
            secondary_sample: secondary_sample.into(),
            tokens,
            http,
            opener,
        }
    }

    async fn reconcile(&self) -> Result<Value, RouterError> {
        let token = self.tokens.acquire().await.map_err(RouterError::Credential)?;

        let primary = load_sample(Arc::clone(&self.opener), self.primary_sample.clone(), "PrimaryCsvFile")
            .await
            .map_err(RouterError::Sample)?;
        let secondary = load_sample(Arc::clone(&self.opener), self.secondary_sample.clone(), "SecondaryCsvFile")
            .await
            .map_err(RouterError::Sample)?;

        let request = AgentRequest::new(&self.endpoint)
            .query("api-version", &self.api_version)
            .file(primary)
            .file(secondary)
            .field("MonetaryKeyStartIndex", MONETARY_KEY_START_INDEX)
            .field("PartialColumnIndexValue", PARTIAL_COLUMN_INDEX)
            .bearer(&token);

        log::info!("[RECONCILIATION] Submitting sample pair to {}", self.endpoint);

        let response = self.http.submit(request).await.map_err(RouterError::Transport)?;
        if !response.is_success() {
            return Err(RouterError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response.result_or_text())
    }
}

#[async_trait]
impl AgentExecutor for ReconciliationExecutor {
    fn kind(&self) -> AgentKind {
        AgentKind::Reconciliation
    }

    async fn execute(&self, _task: &Task, context: &ExecutionContext) -> AgentResult {
        log::debug!("[RECONCILIATION] Run {} starting", context.run_id);
        settle(self.kind(), self.reconcile().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::multi_agent::testing::{reply, CountingOpener, StubHttp, StubTokens};

    fn context() -> ExecutionContext {
        ExecutionContext {
            run_id: "run-1".into(),
            original_input: "reconcile my books".into(),
        }
    }

    fn executor(
        tokens: Arc<StubTokens>,
        http: Arc<StubHttp>,
        opener: Arc<CountingOpener>,
    ) -> ReconciliationExecutor {
        ReconciliationExecutor::new(
            "https://svc.test/recon",
            "2022-03-01-preview",
            "DemoData/Primary.csv",
            "DemoData/Secondary.csv",
            tokens,
            http,
            opener,
        )
    }

    #[tokio::test]
    async fn test_matched_result_is_success() {
        let http = StubHttp::with_replies(vec![reply(200, r#"{"result": "MATCHED"}"#)]);
        let opener = CountingOpener::arc();
        let exec = executor(StubTokens::ok("tok"), http.clone(), opener.clone());

        let result = exec.execute(&Task::new("reconciliation", "match"), &context()).await;

        assert_eq!(result, AgentResult::success("MATCHED"));
        assert_eq!(opener.opened(), 2);
        assert_eq!(opener.released(), 2);

        let requests = http.requests.lock();
        let request = &requests[0];
        assert_eq!(request.endpoint, "https://svc.test/recon");
        assert_eq!(request.query, vec![("api-version".to_string(), "2022-03-01-preview".to_string())]);
        assert_eq!(request.field_value("MonetaryKeyStartIndex"), Some("2"));
        assert_eq!(request.field_value("PartialColumnIndexValue"), Some("-1"));
        assert_eq!(request.files.len(), 2);
        assert_eq!(request.files[0].field, "PrimaryCsvFile");
        assert_eq!(request.files[0].file_name, "Primary.csv");
        assert_eq!(request.files[1].field, "SecondaryCsvFile");
        assert_eq!(request.files[1].content_type, "text/csv");
        assert!(request
            .headers
            .iter()
            .any(|(k, v)| k == "authorization" && v == "Bearer tok"));
    }

    #[tokio::test]
    async fn test_body_without_result_field_falls_back_to_text() {
        let http = StubHttp::with_replies(vec![reply(200, "all rows matched")]);
        let exec = executor(StubTokens::ok("tok"), http, CountingOpener::arc());

        let result = exec.execute(&Task::new("reconciliation", ""), &context()).await;
        assert_eq!(result, AgentResult::success("all rows matched"));
    }

    #[tokio::test]
    async fn test_http_error_is_failure_and_handles_released() {
        let http = StubHttp::with_replies(vec![reply(500, "boom")]);
        let opener = CountingOpener::arc();
        let exec = executor(StubTokens::ok("tok"), http, opener.clone());

        let result = exec.execute(&Task::new("reconciliation", "match"), &context()).await;

        match result {
            AgentResult::Failure(reason) => {
                assert!(reason.contains("500"));
                assert!(reason.contains("boom"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(opener.opened(), 2);
        assert_eq!(opener.released(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let http = StubHttp::with_replies(vec![Err("connection refused".into())]);
        let opener = CountingOpener::arc();
        let exec = executor(StubTokens::ok("tok"), http, opener.clone());

        let result = exec.execute(&Task::new("reconciliation", "match"), &context()).await;

        assert!(matches!(result, AgentResult::Failure(ref r) if r.contains("connection refused")));
        assert_eq!(opener.released(), opener.opened());
    }

    #[tokio::test]
    async fn test_credential_failure_skips_call() {
        let http = StubHttp::with_replies(vec![reply(200, r#"{"result": "MATCHED"}"#)]);
        let opener = CountingOpener::arc();
        let exec = executor(StubTokens::failing("invalid_grant"), http.clone(), opener.clone());

        let result = exec.execute(&Task::new("reconciliation", "match"), &context()).await;

        assert!(matches!(result, AgentResult::Failure(ref r) if r.contains("invalid_grant")));
        assert_eq!(http.request_count(), 0);
        assert_eq!(opener.opened(), 0);
    }

    #[tokio::test]
    async fn test_missing_sample_releases_opened_handle() {
        let http = StubHttp::with_replies(vec![reply(200, "{}")]);
        let opener = CountingOpener::arc();
        let exec = ReconciliationExecutor::new(
            "https://svc.test/recon",
            "v",
            "DemoData/Primary.csv",
            "DemoData/missing.csv",
            StubTokens::ok("tok"),
            http.clone(),
            opener.clone(),
        );

        let result = exec.execute(&Task::new("reconciliation", "match"), &context()).await;

        assert!(!result.is_success());
        assert_eq!(http.request_count(), 0);
        assert_eq!(opener.opened(), 1);
        assert_eq!(opener.released(), 1);
    }
}
