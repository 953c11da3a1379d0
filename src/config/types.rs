// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub bfhl: BfhlConfig,
    pub upstream: UpstreamConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// `/bfhl` service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BfhlConfig {
    /// Operator identifier echoed in every response envelope
    #[serde(default)]
    pub official_email: Option<String>,
    /// Signed so out-of-range settings clamp instead of failing to load
    pub rate_limit_rpm: i64,
}

impl BfhlConfig {
    /// Operator email, `None` when unset or blank
    pub fn official_email(&self) -> Option<&str> {
        non_blank(self.official_email.as_deref())
    }

    /// Requests per minute per client, clamped to `1..=u32::MAX`
    pub fn rate_limit(&self) -> u32 {
        let clamped = self.rate_limit_rpm.clamp(1, i64::from(u32::MAX));
        u32::try_from(clamped).unwrap_or(u32::MAX)
    }
}

/// Text-generation provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// API credential, `None` when unset or blank
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
