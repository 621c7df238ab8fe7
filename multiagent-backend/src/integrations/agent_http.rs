//! HTTP client for the downstream agent services
//!
//! Agent services take multipart uploads (CSV samples plus form fields) and
//! answer with JSON or plain text. Every call is a single attempt: the uploads
//! are not idempotent on the service side, so nothing here retries.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

/// One file attached to a multipart request
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A multipart submission to an agent endpoint
#[derive(Debug, Clone, Default)]
pub struct AgentRequest {
    pub endpoint: String,
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl AgentRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.headers
            .push((header::AUTHORIZATION.as_str().to_string(), format!("Bearer {}", token)));
        self
    }
}

#[cfg(test)]
impl AgentRequest {
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of an agent response
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub status: u16,
    pub body: String,
}

impl AgentResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// The body's `result` field, or the raw body text when there is none
    pub fn result_or_text(&self) -> Value {
        self.json()
            .and_then(|v| v.get("result").cloned())
            .unwrap_or_else(|| Value::String(self.body.clone()))
    }
}

#[async_trait]
pub trait AgentHttpClient: Send + Sync {
    /// Transport failures are `Err`; any HTTP status is `Ok`
    async fn submit(&self, request: AgentRequest) -> Result<AgentResponse, String>;
}

/// reqwest-backed client
pub struct ReqwestAgentClient {
    client: Client,
}

impl ReqwestAgentClient {
    pub fn new(tls_insecure: bool) -> Result<Self, String> {
        let client = Client::builder()
            .danger_accept_invalid_certs(tls_insecure)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AgentHttpClient for ReqwestAgentClient {
    async fn submit(&self, request: AgentRequest) -> Result<AgentResponse, String> {
        let mut form = Form::new();
        for (name, value) in request.fields {
            form = form.text(name, value);
        }
        for file in request.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|e| format!("Invalid content type '{}': {}", file.content_type, e))?;
            form = form.part(file.field, part);
        }

        let mut builder = self.client.post(&request.endpoint).multipart(form);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        log::debug!("[AGENT_HTTP] POST {}", request.endpoint);

        let response = builder
            .send()
            .await
            .map_err(|e| format!("Request to {} failed: {}", request.endpoint, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response from {}: {}", request.endpoint, e))?;

        Ok(AgentResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> AgentResponse {
        AgentResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_result_field_is_extracted() {
        let r = response(200, r#"{"result": "MATCHED", "other": 1}"#);
        assert_eq!(r.result_or_text(), json!("MATCHED"));
    }

    #[test]
    fn test_missing_result_falls_back_to_text() {
        let r = response(200, r#"{"status": "done"}"#);
        assert_eq!(r.result_or_text(), json!(r#"{"status": "done"}"#));

        let r = response(200, "plain text");
        assert_eq!(r.result_or_text(), json!("plain text"));
    }

    #[test]
    fn test_success_range() {
        assert!(response(200, "").is_success());
        assert!(response(204, "").is_success());
        assert!(!response(302, "").is_success());
        assert!(!response(404, "").is_success());
        assert!(!response(500, "").is_success());
    }

    #[test]
    fn test_request_builder() {
        let req = AgentRequest::new("https://svc.test/run")
            .field("a", "1")
            .query("api-version", "v1")
            .bearer("tok");
        assert_eq!(req.field_value("a"), Some("1"));
        assert_eq!(req.field_value("b"), None);
        assert_eq!(req.query, vec![("api-version".to_string(), "v1".to_string())]);
        assert_eq!(req.headers[0].1, "Bearer tok");
    }
}
