//! Bearer token acquisition for the agent services

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Tokens are refreshed this long before the identity provider's expiry
const EXPIRY_MARGIN_SECS: u64 = 60;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire(&self) -> Result<String, String>;
}

/// Fixed token from the environment
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn acquire(&self) -> Result<String, String> {
        Ok(self.token.clone())
    }
}

/// Identity client settings, in the layout of the shared `config.json`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClientConfig {
    #[serde(rename = "ClientId")]
    pub client_id: String,
    #[serde(rename = "TenantId")]
    pub tenant_id: String,
    #[serde(rename = "TestUserId")]
    pub username: String,
    #[serde(rename = "ClientScopes")]
    pub scopes: Vec<String>,
}

impl TokenClientConfig {
    pub async fn load(path: &Path) -> Result<Self, String> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Could not read token config {}: {}", path.display(), e))?;
        serde_json::from_str(&raw)
            .map_err(|e| format!("Invalid token config {}: {}", path.display(), e))
    }

    pub fn token_url(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        )
    }
}

/// A freshly issued token and its lifetime in seconds
#[derive(Debug, Clone)]
pub struct GrantedToken {
    pub token: String,
    pub expires_in: u64,
}

/// One round trip to an identity provider
#[async_trait]
pub trait TokenGrant: Send + Sync {
    async fn request(&self) -> Result<GrantedToken, String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Resource-owner password grant against the tenant's token endpoint.
/// The config file is read on each request so it can change without a restart.
pub struct PasswordGrant {
    client: Client,
    config_path: PathBuf,
}

impl PasswordGrant {
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            config_path: config_path.into(),
        })
    }
}

#[async_trait]
impl TokenGrant for PasswordGrant {
    async fn request(&self) -> Result<GrantedToken, String> {
        let config = TokenClientConfig::load(&self.config_path).await?;
        let password = std::env::var("TEST_USER_PASSWORD")
            .map_err(|_| "TEST_USER_PASSWORD must be set for password grant".to_string())?;

        let scope = config.scopes.join(" ");
        let form = [
            ("grant_type", "password"),
            ("client_id", config.client_id.as_str()),
            ("username", config.username.as_str()),
            ("password", password.as_str()),
            ("scope", scope.as_str()),
        ];

        log::info!("[TOKEN] Acquiring access token for {}", config.username);

        let response = self
            .client
            .post(config.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| format!("Token request failed: {}", e))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse token response: {}", e))?;

        match body.access_token {
            Some(token) => Ok(GrantedToken {
                token,
                expires_in: body.expires_in.unwrap_or(3600),
            }),
            None => Err(format!(
                "Access token acquisition failed: {}",
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| "no access_token in response".to_string())
            )),
        }
    }
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Caches the tokens of a grant until shortly before they expire.
/// Concurrent callers on a cold cache share one grant request.
pub struct CachedTokenProvider<G> {
    grant: G,
    cache: Mutex<Option<CachedToken>>,
    refresh: tokio::sync::Mutex<()>,
}

impl<G: TokenGrant> CachedTokenProvider<G> {
    pub fn new(grant: G) -> Self {
        Self {
            grant,
            cache: Mutex::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    fn cached(&self) -> Option<String> {
        let cache = self.cache.lock();
        cache
            .as_ref()
            .filter(|c| c.expires_at > Instant::now())
            .map(|c| c.token.clone())
    }

    fn store(&self, token: &str, expires_in: u64) {
        let lifetime = expires_in.saturating_sub(EXPIRY_MARGIN_SECS);
        *self.cache.lock() = Some(CachedToken {
            token: token.to_string(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
    }
}

#[async_trait]
impl<G: TokenGrant> TokenProvider for CachedTokenProvider<G> {
    async fn acquire(&self) -> Result<String, String> {
        if let Some(token) = self.cached() {
            log::debug!("[TOKEN] Using cached access token");
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached() {
            log::debug!("[TOKEN] Using token refreshed by a concurrent caller");
            return Ok(token);
        }

        let granted = self.grant.request().await?;
        self.store(&granted.token, granted.expires_in);
        Ok(granted.token)
    }
}
