//! Agent configuration parameters
//!
//! Construction-time settings for the VRPC agent. Every field is optional in
//! the serialised form; missing fields take the documented defaults.

use serde::{Deserialize, Serialize};

/// Upper bound for a single MQTT message, fixed at compile time because the
/// inbound queue stores payloads in `heapless` buffers of this size.
pub const MAX_PAYLOAD_CAPACITY: usize = 4096;

/// Smallest payload limit that still fits a capability advertisement.
pub const MIN_PAYLOAD_BYTES: usize = 128;

/// Core agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    // --- Transport ---
    /// Maximum size of a single MQTT message in bytes
    pub max_payload_bytes: usize,
    /// Broker host name or address
    pub broker_host: String,
    /// Broker TCP port
    pub broker_port: u16,
    /// MQTT keep-alive interval (seconds)
    pub keep_alive_secs: u16,
    /// How long a single connect attempt may block (milliseconds)
    pub connect_timeout_ms: u32,

    // --- Addressing ---
    /// Domain under which the agent is reachable (first topic segment)
    pub domain: String,

    // --- Credentials ---
    /// Access token, or broker password when `username` is set
    pub token: Option<String>,
    /// Broker username
    pub username: Option<String>,

    // --- Timing ---
    /// Minimum interval between connection attempts (milliseconds)
    pub retry_interval_ms: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            // Transport
            max_payload_bytes: 1024,
            broker_host: "vrpc.io".to_string(),
            broker_port: 1883,
            keep_alive_secs: 30,
            connect_timeout_ms: 5000,

            // Addressing
            domain: "public.vrpc".to_string(),

            // Credentials
            token: None,
            username: None,

            // Timing
            retry_interval_ms: 5000,
        }
    }
}

impl AgentConfig {
    /// Parse a JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes < MIN_PAYLOAD_BYTES
            || self.max_payload_bytes > MAX_PAYLOAD_CAPACITY
        {
            return Err(ConfigError::ValidationFailed(
                "max_payload_bytes outside 128..=4096",
            ));
        }
        if self.broker_host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_host is empty"));
        }
        if self.broker_port == 0 {
            return Err(ConfigError::ValidationFailed("broker_port is zero"));
        }
        if !is_topic_segment(&self.domain) {
            return Err(ConfigError::ValidationFailed(
                "domain must be a single non-empty topic segment",
            ));
        }
        if self.retry_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("retry_interval_ms is zero"));
        }
        if self.token.as_deref() == Some("") || self.username.as_deref() == Some("") {
            return Err(ConfigError::ValidationFailed(
                "credentials must be omitted rather than empty",
            ));
        }
        Ok(())
    }

    /// Broker URL in the form the ESP-IDF MQTT client expects.
    pub fn broker_url(&self) -> String {
        format!("mqtt://{}:{}", self.broker_host, self.broker_port)
    }
}

/// A topic segment may not be empty, contain the level separator, or contain
/// MQTT wildcards.
fn is_topic_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(['/', '+', '#'])
}

/// Errors from loading or validating [`AgentConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The stored document could not be deserialised.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
