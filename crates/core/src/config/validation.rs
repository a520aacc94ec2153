//! Configuration validation rules.
//!
//! Runs on `AppConfig` once figment has merged defaults, the TOML file and
//! the environment.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// Credentials are not checked here; they are required only for the
    /// provider families actually routed to, see
    /// [`ProviderRegistry::from_config`](crate::ProviderRegistry::from_config).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `bind_addr` is not a socket address
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - any TTL is 0
    /// - `ephemeral_capacity_mb` is 0 or exceeds 4096
    /// - `allowed_origins` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "bind_addr".into(),
                reason: format!("not a socket address: {}", self.bind_addr),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for (field, value) in [
            ("result_ttl_secs", self.result_ttl_secs),
            ("edge_ttl_secs", self.edge_ttl_secs),
            ("ephemeral_default_ttl_secs", self.ephemeral_default_ttl_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
            }
        }

        if self.ephemeral_capacity_mb == 0 || self.ephemeral_capacity_mb > 4096 {
            return Err(ConfigError::Invalid {
                field: "ephemeral_capacity_mb".into(),
                reason: "must be between 1 and 4096".into(),
            });
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allowed_origins".into(),
                reason: "must list at least one origin (use \"*\" to allow any)".into(),
            });
        }

        if self.allowed_origins.len() > 1 && self.allowed_origins.iter().any(|o| o == "*") {
            tracing::warn!(
                origin_count = self.allowed_origins.len(),
                "allowed_origins mixes \"*\" with explicit origins; \"*\" is treated as a literal origin"
            );
        }

        Ok(())
    }
}
