//! Presence and capability payloads.
//!
//! Both are published retained so late subscribers (remote tooling) learn
//! the agent's state and exposed functions without polling.

use serde::{Deserialize, Serialize};

use super::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    Offline,
}

/// Payload of `<domain>/<agentId>/__agentInfo__`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub status: AgentStatus,
    pub hostname: String,
}

impl AgentInfo {
    pub fn new(status: AgentStatus, hostname: &str) -> Self {
        Self {
            status,
            hostname: hostname.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain strings only; serialisation cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Payload of `<domain>/<agentId>/<className>/__classInfo__`.
///
/// Only static functions are advertised; instances and member functions are
/// always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub class_name: String,
    pub instances: Vec<String>,
    pub member_functions: Vec<String>,
    pub static_functions: Vec<String>,
}

impl ClassInfo {
    pub fn from_registry(registry: &Registry, context: &str) -> Self {
        Self {
            class_name: context.to_string(),
            instances: Vec::new(),
            member_functions: Vec::new(),
            static_functions: registry.methods(context).map(str::to_owned).collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One [`ClassInfo`] per registered context, in registry order.
pub fn describe_capabilities(registry: &Registry) -> Vec<ClassInfo> {
    registry
        .contexts()
        .map(|context| ClassInfo::from_registry(registry, context))
        .collect()
}
