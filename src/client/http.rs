use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::transport::{ApiResponse, Method, Transport};
use crate::error::{Result, StingrayError};

/// Default REST API port of a traffic manager
pub const DEFAULT_API_PORT: u16 = 9070;

/// Default REST API version
pub const DEFAULT_API_VERSION: &str = "2.0";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything needed to open a session against one traffic manager
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Hostname or address of the traffic manager (e.g., "lb1.example.com")
    pub host: String,

    /// REST API port (default: 9070)
    pub port: u16,

    pub username: String,
    pub password: String,

    /// REST API version segment of the URL (default: "2.0")
    pub api_version: String,

    /// Accept self-signed certificates
    pub insecure: bool,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// URL scheme, "https" unless pointed at a plain-HTTP endpoint
    pub scheme: String,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("api_root", &self.api_root())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionSettings {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_API_PORT,
            username: username.into(),
            password: password.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            insecure: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            scheme: "https".to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// `scheme://host:port`
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Path prefix of the REST API, e.g. `/api/tm/2.0`
    pub fn api_path(&self) -> String {
        format!("/api/tm/{}", self.api_version)
    }

    /// `scheme://host:port/api/tm/{version}`
    pub fn api_root(&self) -> String {
        format!("{}{}", self.origin(), self.api_path())
    }
}

// ============================================================================
// SBIO: Pure URL resolution
// ============================================================================

/// Resolve a request path to a full URL.
///
/// The API hands out `href`s that already carry the API prefix
/// (`/api/tm/2.0/status/tm1/`), while callers address configuration with
/// paths relative to the API root (`/config/active/pools`). Both are accepted.
pub fn resolve_url(settings: &ConnectionSettings, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let api_path = settings.api_path();
    if path.starts_with(&api_path) {
        format!("{}{}", settings.origin(), path)
    } else if path.is_empty() || path.starts_with('/') {
        format!("{}{}", settings.api_root(), path)
    } else {
        format!("{}/{}", settings.api_root(), path)
    }
}

// ============================================================================
// SBIO: I/O implementation (real HTTP client)
// ============================================================================

/// Authenticated session against a traffic manager REST API.
///
/// A value of this type only exists once the credentials have been accepted:
/// [`HttpClient::connect`] probes the API root and fails fast on a 401.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    settings: ConnectionSettings,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_root", &self.settings.api_root())
            .field("username", &self.settings.username)
            .finish()
    }
}

impl HttpClient {
    /// Open a session and verify the credentials.
    pub async fn connect(settings: ConnectionSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .danger_accept_invalid_certs(settings.insecure)
            .build()
            .map_err(|e| StingrayError::Http(e.to_string()))?;

        let http = Self { client, settings };

        let response = http.execute(Method::Get, "", None).await?;
        if !response.is_success() {
            return Err(StingrayError::Http(format!(
                "HTTP {} from {}",
                response.status,
                http.settings.api_root()
            )));
        }

        info!(
            "Connected to {} as {}",
            http.settings.api_root(),
            http.settings.username
        );
        Ok(http)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = resolve_url(&self.settings, path);

        let mut req = self
            .client
            .request(method.into(), &url)
            .basic_auth(&self.settings.username, Some(&self.settings.password));
        if let Some(body) = body {
            req = req.json(body);
        }

        let started = Instant::now();
        let response = req
            .send()
            .await
            .map_err(|e| StingrayError::Http(e.to_string()))?;
        let status = response.status().as_u16();

        debug!(
            "{} {} -> {} ({} ms)",
            method,
            url,
            status,
            started.elapsed().as_millis()
        );

        if status == 401 {
            return Err(StingrayError::AuthorizationFailure(format!(
                "credentials for {} rejected by {}",
                self.settings.username,
                self.settings.origin()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StingrayError::Http(e.to_string()))?;

        let body = if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            None
        } else {
            Some(
                serde_json::from_slice::<Value>(&bytes)
                    .map_err(|e| StingrayError::Parse(e.to_string()))?,
            )
        };

        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConnectionSettings {
        ConnectionSettings::new("dev-api", "user1", "pass123")
    }

    #[test]
    fn test_api_root_defaults() {
        assert_eq!(settings().api_root(), "https://dev-api:9070/api/tm/2.0");
    }

    #[test]
    fn test_api_root_overrides() {
        let s = settings()
            .with_port(8443)
            .with_api_version("3.4")
            .with_scheme("http");
        assert_eq!(s.api_root(), "http://dev-api:8443/api/tm/3.4");
    }

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(
            resolve_url(&settings(), "/config/active/pools"),
            "https://dev-api:9070/api/tm/2.0/config/active/pools"
        );
        assert_eq!(
            resolve_url(&settings(), "status"),
            "https://dev-api:9070/api/tm/2.0/status"
        );
        assert_eq!(resolve_url(&settings(), ""), "https://dev-api:9070/api/tm/2.0");
    }

    #[test]
    fn test_resolve_href_with_api_prefix() {
        assert_eq!(
            resolve_url(&settings(), "/api/tm/2.0/status/tm1/statistics/nodes/per_pool_node/"),
            "https://dev-api:9070/api/tm/2.0/status/tm1/statistics/nodes/per_pool_node/"
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        assert_eq!(
            resolve_url(&settings(), "https://other:9070/api/tm/2.0/status"),
            "https://other:9070/api/tm/2.0/status"
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let s = settings();
        let client = HttpClient {
            client: reqwest::Client::new(),
            settings: s,
        };
        let out = format!("{:?}", client);
        assert!(out.contains("user1"));
        assert!(!out.contains("pass123"));
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let out = format!("{:?}", settings());
        assert!(out.contains("https://dev-api:9070/api/tm/2.0"));
        assert!(out.contains("user1"));
        assert!(!out.contains("pass123"));
    }
}
