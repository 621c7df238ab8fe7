use crate::ai::Message;
use crate::config::OpenAIConfig;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAICompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAICompletionResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

/// Azure OpenAI resources authenticate with `api-key` and address a deployment by path
fn is_azure_endpoint(endpoint: &str) -> bool {
    endpoint.contains(".openai.azure.com")
}

fn completions_url(config: &OpenAIConfig) -> String {
    if is_azure_endpoint(&config.endpoint) {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint.trim_end_matches('/'),
            config.deployment,
            config.api_version
        )
    } else {
        config.endpoint.clone()
    }
}

impl OpenAIClient {
    pub fn new(config: &OpenAIConfig) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Only add auth header if API key is provided and not empty
        if !config.api_key.is_empty() {
            if is_azure_endpoint(&config.endpoint) {
                let value = header::HeaderValue::from_str(&config.api_key)
                    .map_err(|e| format!("Invalid API key format: {}", e))?;
                headers.insert("api-key", value);
            } else {
                let value = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                    .map_err(|e| format!("Invalid API key format: {}", e))?;
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            url: completions_url(config),
            model: config.deployment.clone(),
        })
    }

    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        let request = OpenAICompletionRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|m| OpenAIMessage {
                    role: m.role.to_string(),
                    content: m.content,
                })
                .collect(),
            temperature: 0.0,
        };

        log::info!(
            "[OPENAI] Sending request to {} with model {} ({} messages)",
            self.url,
            self.model,
            request.messages.len()
        );
        log::debug!(
            "[OPENAI] Full request:\n{}",
            serde_json::to_string_pretty(&request).unwrap_or_default()
        );

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("OpenAI API request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                return Err(format!("OpenAI API error: {}", error_response.error.message));
            }

            return Err(format!(
                "OpenAI API returned error status: {}, body: {}",
                status, error_text
            ));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read OpenAI response: {}", e))?;

        log::debug!("[OPENAI] Raw response:\n{}", response_text);

        extract_content(&response_text)
    }
}

/// Pull the first choice's text out of a completion body
fn extract_content(response_text: &str) -> Result<String, String> {
    let response_data: OpenAICompletionResponse = serde_json::from_str(response_text)
        .map_err(|e| format!("Failed to parse OpenAI response: {} - body: {}", e, response_text))?;

    let choice = response_data
        .choices
        .first()
        .ok_or_else(|| "OpenAI API returned no choices".to_string())?;

    log::info!(
        "[OPENAI] Response - content_len: {}, finish_reason: {:?}",
        choice.message.content.as_ref().map(|c| c.len()).unwrap_or(0),
        choice.finish_reason
    );

    Ok(choice.message.content.clone().unwrap_or_default())
}
