//! Agent identity and broker credentials.
//!
//! | configured          | username            | password            |
//! |---------------------|---------------------|---------------------|
//! | username (+ token)  | username            | token, else derived |
//! | token only          | `__token__`         | token               |
//! | neither             | client id           | derived             |
//!
//! The derived token is the first 16 hex chars of
//! SHA-256(device id ‖ build timestamp), so it is stable for one firmware
//! build on one device.

use core::fmt::Write;

use crate::config::AgentConfig;

/// Client id prefix in front of the agent id.
pub const CLIENT_ID_PREFIX: &str = "vrpca";

/// Username sent when only a token is configured.
pub const TOKEN_USERNAME: &str = "__token__";

/// Hex chars of the derived token.
const DERIVED_TOKEN_LEN: usize = 16;

/// Build timestamp exported by `build.rs`.
pub const BUILD_TIMESTAMP: &str = env!("VRPC_BUILD_TIMESTAMP");

/// Immutable once the agent starts connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub domain: String,
    pub agent_id: String,
    pub hostname: String,
    pub username: String,
    pub token: String,
}

impl AgentIdentity {
    pub fn new(config: &AgentConfig, agent_id: &str, hostname: &str) -> Self {
        Self::with_build_timestamp(config, agent_id, hostname, BUILD_TIMESTAMP)
    }

    pub fn with_build_timestamp(
        config: &AgentConfig,
        agent_id: &str,
        hostname: &str,
        build_timestamp: &str,
    ) -> Self {
        let client_id = client_id(agent_id);
        let (username, token) = match (&config.username, &config.token) {
            (Some(user), Some(token)) => (user.clone(), token.clone()),
            (Some(user), None) => (user.clone(), derived_token(agent_id, build_timestamp)),
            (None, Some(token)) => (TOKEN_USERNAME.to_string(), token.clone()),
            (None, None) => (client_id, derived_token(agent_id, build_timestamp)),
        };
        Self {
            domain: config.domain.clone(),
            agent_id: agent_id.to_string(),
            hostname: hostname.to_string(),
            username,
            token,
        }
    }

    pub fn client_id(&self) -> String {
        client_id(&self.agent_id)
    }
}

pub fn client_id(agent_id: &str) -> String {
    format!("{CLIENT_ID_PREFIX}{agent_id}")
}

pub fn derived_token(device_id: &str, build_timestamp: &str) -> String {
    let mut hasher = hmac_sha256::Hash::new();
    hasher.update(device_id.as_bytes());
    hasher.update(build_timestamp.as_bytes());
    let digest = hasher.finalize();

    let mut token = String::with_capacity(DERIVED_TOKEN_LEN);
    for b in digest.iter().take(DERIVED_TOKEN_LEN / 2) {
        let _ = write!(token, "{b:02x}");
    }
    token
}
