// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    BfhlConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    UpstreamConfig,
};

/// Default config file, extension optional
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence, lowest first: defaults, config file, `BFHL_` environment
    /// variables (`BFHL_SERVER__PORT`), then the flat `OFFICIAL_EMAIL`,
    /// `OPENAI_API_KEY`, `PORT` and `RATE_LIMIT_RPM` variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("BFHL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "bfhl-api")?
            .set_default("http.max_body_size", 65_536)? // 64KB
            .set_default("bfhl.rate_limit_rpm", 60)?
            .set_default("upstream.endpoint", "https://api.openai.com/v1/responses")?
            .set_default("upstream.model", "gpt-4.1-mini")?
            .set_default("upstream.max_output_tokens", 16)?
            .set_default("upstream.timeout_secs", 15)?
            .set_override_option("bfhl.official_email", env_var("OFFICIAL_EMAIL"))?
            .set_override_option("upstream.api_key", env_var("OPENAI_API_KEY"))?
            .set_override_option("server.port", env_var("PORT"))?
            .set_override_option("bfhl.rate_limit_rpm", env_var("RATE_LIMIT_RPM"))?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Fully populated configuration for unit tests
    pub fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpConfig {
                server_name: "bfhl-test".to_string(),
                max_body_size: 65_536,
            },
            bfhl: BfhlConfig {
                official_email: Some("ops@example.com".to_string()),
                rate_limit_rpm: 60,
            },
            upstream: UpstreamConfig {
                api_key: None,
                endpoint: "http://127.0.0.1:9/v1/responses".to_string(),
                model: "test-model".to_string(),
                max_output_tokens: 16,
                timeout_secs: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_config;
    use super::Config;

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut config = test_config();
        config.bfhl.official_email = Some("   ".to_string());
        config.upstream.api_key = Some(String::new());
        assert_eq!(config.bfhl.official_email(), None);
        assert_eq!(config.upstream.api_key(), None);

        config.bfhl.official_email = Some(" ops@example.com ".to_string());
        assert_eq!(config.bfhl.official_email(), Some("ops@example.com"));
    }

    #[test]
    fn test_rate_limit_floor() {
        let mut config = test_config();
        config.bfhl.rate_limit_rpm = 0;
        assert_eq!(config.bfhl.rate_limit(), 1);
        config.bfhl.rate_limit_rpm = -5;
        assert_eq!(config.bfhl.rate_limit(), 1);
        config.bfhl.rate_limit_rpm = 120;
        assert_eq!(config.bfhl.rate_limit(), 120);
        config.bfhl.rate_limit_rpm = i64::MAX;
        assert_eq!(config.bfhl.rate_limit(), u32::MAX);
    }

    #[test]
    fn test_negative_rate_limit_from_env() {
        // Only this test touches RATE_LIMIT_RPM
        std::env::set_var("RATE_LIMIT_RPM", "-5");
        let loaded = Config::load_from("no-such-dir/config");
        std::env::remove_var("RATE_LIMIT_RPM");

        let config = loaded.expect("negative limit still loads");
        assert_eq!(config.bfhl.rate_limit_rpm, -5);
        assert_eq!(config.bfhl.rate_limit(), 1);
    }

    #[test]
    fn test_socket_addr() {
        let mut config = test_config();
        config.server.port = 3000;
        assert_eq!(
            config.get_socket_addr().map(|a| a.to_string()),
            Ok("127.0.0.1:3000".to_string())
        );
        config.server.host = "not a host".to_string();
        assert!(config.get_socket_addr().is_err());
    }
}
