use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for pentest-findings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Report backend settings
    pub api: ApiConfig,
    /// Query cache settings
    pub cache: CacheConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the report backend
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum cached query results
    pub capacity: u64,
    /// Time-to-live per entry in seconds
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_seconds: 30,
            },
            cache: CacheConfig {
                capacity: 1000,
                ttl_seconds: 300,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. pentest-findings.toml (if present)
    /// 3. Environment variables prefixed with PENTEST_FINDINGS_
    pub fn load() -> Result<Self> {
        let defaults = AppConfig::default();

        let mut builder = Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_seconds", defaults.api.timeout_seconds)?
            .set_default("cache.capacity", defaults.cache.capacity)?
            .set_default("cache.ttl_seconds", defaults.cache.ttl_seconds)?
            .set_default("observability.log_level", defaults.observability.log_level)?;

        if Path::new("pentest-findings.toml").exists() {
            builder = builder.add_source(File::with_name("pentest-findings"));
        }

        builder = builder.add_source(
            Environment::with_prefix("PENTEST_FINDINGS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load .env file if it exists.
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.cache.capacity, 1000);
    }
}
