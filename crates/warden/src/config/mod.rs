use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, WardenError};

/// Main configuration structure for Warden
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP proxy configuration
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Credential names used for proxy and admin authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-agent request ceilings
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Secret scanning configuration
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Audit log retention
    #[serde(default)]
    pub audit: AuditConfig,
    /// Outbound alert delivery
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Provider routing table
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            auth: AuthConfig::default(),
            limits: LimitsConfig::default(),
            scanner: ScannerConfig::default(),
            audit: AuditConfig::default(),
            alerts: AlertConfig::default(),
            routes: default_routes(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing sections and fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WardenError::Config(format!("Failed to parse config: {e}")))
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WardenError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }
}

/// HTTP proxy server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Address to listen on (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Names of the shared secrets in the credential vault
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Vault key holding the bearer token agents must present
    #[serde(default = "default_proxy_token_key")]
    pub proxy_token_key: String,
    /// Vault key holding the admin namespace key
    #[serde(default = "default_admin_key_key")]
    pub admin_key_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            proxy_token_key: default_proxy_token_key(),
            admin_key_key: default_admin_key_key(),
        }
    }
}

fn default_proxy_token_key() -> String {
    "WARDEN_PROXY_TOKEN".to_string()
}

fn default_admin_key_key() -> String {
    "WARDEN_ADMIN_KEY".to_string()
}

/// Request ceilings applied to every agent
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum admitted requests per agent per clock minute
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u64,
    /// Maximum admitted requests per agent per clock hour
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
        }
    }
}

fn default_requests_per_minute() -> u64 {
    60
}

fn default_requests_per_hour() -> u64 {
    1000
}

/// Secret scanning configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Inbound patterns used when the store holds no pattern list
    #[serde(default = "default_inbound_patterns")]
    pub inbound_patterns: Vec<String>,
    /// Vault keys of decoy credentials whose appearance signals compromise
    #[serde(default)]
    pub honeypot_keys: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            inbound_patterns: default_inbound_patterns(),
            honeypot_keys: Vec::new(),
        }
    }
}

fn default_inbound_patterns() -> Vec<String> {
    [
        r"sk-[a-z0-9_\-]{20,}",
        r"AKIA[0-9A-Z]{16}",
        r"gh[pousr]_[a-z0-9]{36,}",
        r"xox[baprs]-[a-z0-9\-]{10,}",
        r"-----BEGIN [A-Z ]*PRIVATE KEY-----",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// Audit log retention configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Days before audit records expire from the store
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

fn default_retention_days() -> u64 {
    7
}

/// Outbound alert configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertConfig {
    /// Webhook receiving alert messages (alerts disabled when unset)
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Also alert on policy blocks, not just response leaks
    #[serde(default)]
    pub notify_on_block: bool,
}

/// A single provider route
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RouteConfig {
    /// First path segment selecting this provider (e.g., "openai")
    pub prefix: String,
    /// Upstream base URL requests are forwarded to
    pub upstream: String,
    /// Header carrying the provider credential
    #[serde(default = "default_credential_header")]
    pub credential_header: String,
    /// Text prepended to the credential value (e.g., "Bearer ")
    #[serde(default)]
    pub credential_prefix: String,
    /// Vault key of the provider credential
    pub credential_key: String,
}

fn default_credential_header() -> String {
    "authorization".to_string()
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            prefix: "openai".to_string(),
            upstream: "https://api.openai.com".to_string(),
            credential_header: "authorization".to_string(),
            credential_prefix: "Bearer ".to_string(),
            credential_key: "OPENAI_API_KEY".to_string(),
        },
        RouteConfig {
            prefix: "anthropic".to_string(),
            upstream: "https://api.anthropic.com".to_string(),
            credential_header: "x-api-key".to_string(),
            credential_prefix: String::new(),
            credential_key: "ANTHROPIC_API_KEY".to_string(),
        },
        RouteConfig {
            prefix: "openrouter".to_string(),
            upstream: "https://openrouter.ai/api".to_string(),
            credential_header: "authorization".to_string(),
            credential_prefix: "Bearer ".to_string(),
            credential_key: "OPENROUTER_API_KEY".to_string(),
        },
        RouteConfig {
            prefix: "groq".to_string(),
            upstream: "https://api.groq.com/openai".to_string(),
            credential_header: "authorization".to_string(),
            credential_prefix: "Bearer ".to_string(),
            credential_key: "GROQ_API_KEY".to_string(),
        },
    ]
}
