//! MQTT topic addressing.
//!
//! ```text
//! <domain>/<agentId>/<className>/<__static__ | instanceId>/<methodName>   method call
//! <domain>/<agentId>/__agentInfo__                                        presence
//! <domain>/<agentId>/<className>/__classInfo__                            capabilities
//! ```

/// Instance segment addressing a class's static functions.
pub const STATIC_INSTANCE: &str = "__static__";

/// Last segment of the presence topic.
pub const AGENT_INFO: &str = "__agentInfo__";

/// Last segment of a capability topic.
pub const CLASS_INFO: &str = "__classInfo__";

/// Number of segments in a method-call topic.
pub const METHOD_TOPIC_SEGMENTS: usize = 5;

/// Borrowed view of a method-call topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodTopic<'a> {
    pub domain: &'a str,
    pub agent_id: &'a str,
    pub class_name: &'a str,
    pub instance: &'a str,
    pub method: &'a str,
}

impl<'a> MethodTopic<'a> {
    /// Split `topic` into its five segments. Any other segment count is not
    /// a method-call topic.
    pub fn parse(topic: &'a str) -> Option<Self> {
        let mut segments: heapless::Vec<&'a str, METHOD_TOPIC_SEGMENTS> = heapless::Vec::new();
        for segment in topic.split('/') {
            segments.push(segment).ok()?;
        }
        match segments.as_slice() {
            &[domain, agent_id, class_name, instance, method] => Some(Self {
                domain,
                agent_id,
                class_name,
                instance,
                method,
            }),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.instance == STATIC_INSTANCE
    }

    /// Registry context the call resolves against: the class for static
    /// calls, the instance id otherwise.
    pub fn context(&self) -> &'a str {
        if self.is_static() {
            self.class_name
        } else {
            self.instance
        }
    }
}

/// Topic of a static method the agent subscribes to.
pub fn static_method_topic(domain: &str, agent_id: &str, class_name: &str, method: &str) -> String {
    format!("{domain}/{agent_id}/{class_name}/{STATIC_INSTANCE}/{method}")
}

pub fn agent_info_topic(domain: &str, agent_id: &str) -> String {
    format!("{domain}/{agent_id}/{AGENT_INFO}")
}

pub fn class_info_topic(domain: &str, agent_id: &str, class_name: &str) -> String {
    format!("{domain}/{agent_id}/{class_name}/{CLASS_INFO}")
}
