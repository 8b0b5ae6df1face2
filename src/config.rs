use std::time::Duration;

use crate::error::ConfigurationError;

/// Runtime configuration for the registries and the HTTP boundary.
#[derive(Debug, Clone)]
pub struct SwitchboardConfig {
    /// How often the background sweep evicts expired registrations.
    pub sweep_interval: Duration,
    /// How long the REST dispatch flow waits for an executor to produce an
    /// initial response before giving up on the HTTP request.
    pub response_timeout: Duration,
    /// Ceiling applied to inbound HTTP request bodies before buffering.
    pub max_request_body_bytes: usize,
    /// Hex-encoded ed25519 public key used to verify inbound requests.
    pub public_key: Option<String>,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5),
            response_timeout: Duration::from_secs(15),
            max_request_body_bytes: 1024 * 1024,
            public_key: None,
        }
    }
}

impl SwitchboardConfig {
    /// Load the configuration from `SWITCHBOARD_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Ok(millis) = std::env::var("SWITCHBOARD_SWEEP_INTERVAL_MS") {
            config.sweep_interval = Duration::from_millis(millis.parse().map_err(|e| {
                ConfigurationError::invalid("sweep_interval_ms", format!("{e}"))
            })?);
        }

        if let Ok(millis) = std::env::var("SWITCHBOARD_RESPONSE_TIMEOUT_MS") {
            config.response_timeout = Duration::from_millis(millis.parse().map_err(|e| {
                ConfigurationError::invalid("response_timeout_ms", format!("{e}"))
            })?);
        }

        if let Ok(bytes) = std::env::var("SWITCHBOARD_MAX_REQUEST_BODY_BYTES") {
            config.max_request_body_bytes = bytes.parse().map_err(|e| {
                ConfigurationError::invalid("max_request_body_bytes", format!("{e}"))
            })?;
        }

        if let Ok(key) = std::env::var("SWITCHBOARD_PUBLIC_KEY") {
            config.public_key = Some(key);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.max_request_body_bytes, 1024 * 1024);
        assert!(config.public_key.is_none());
    }

    #[test]
    fn test_from_env_rejects_malformed_values() {
        std::env::set_var("SWITCHBOARD_SWEEP_INTERVAL_MS", "not-a-number");
        let result = SwitchboardConfig::from_env();
        std::env::remove_var("SWITCHBOARD_SWEEP_INTERVAL_MS");
        assert!(result.is_err());
    }
}
