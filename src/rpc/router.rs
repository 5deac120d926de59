//! Protocol router: translates broker traffic into registry dispatch.
//!
//! ```text
//!  (topic, payload) ──▶ MethodTopic::parse ──▶ CallEnvelope::parse
//!                                                   │
//!                         context/method from topic ▼
//!                                           Registry::dispatch
//!                                                   │
//!  Publication { topic: sender, payload } ◀── strip c/f/s, serialise
//! ```
//!
//! The router holds no state beyond the registry reference and addressing
//! data. Every failure is either dropped with a log line (bad topic, no
//! reply topic) or turned into an error reply; none is fatal.

use log::{debug, warn};

use crate::app::ports::Qos;

use super::discovery::{ClassInfo, describe_capabilities};
use super::envelope::{CallEnvelope, CallError};
use super::registry::Registry;
use super::topic::{MethodTopic, class_info_topic, static_method_topic};

/// A message the agent should publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
    pub qos: Qos,
}

/// Outcome of routing one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedCall {
    /// Reply topic taken from the request's sender field, if any.
    pub reply_to: Option<String>,
    /// Reply envelope with routing fields removed.
    pub reply: CallEnvelope,
    /// Whether the registry was consulted.
    pub dispatched: bool,
}

pub struct Router<'r> {
    registry: &'r Registry,
    domain: String,
    agent_id: String,
    max_payload_bytes: usize,
}

impl<'r> Router<'r> {
    pub fn new(registry: &'r Registry, domain: &str, agent_id: &str, max_payload_bytes: usize) -> Self {
        Self {
            registry,
            domain: domain.to_string(),
            agent_id: agent_id.to_string(),
            max_payload_bytes,
        }
    }

    /// Handle one inbound message and build the reply publication.
    ///
    /// Returns `None` when the topic is malformed or the request carries no
    /// reply topic.
    pub fn on_inbound_message(&self, topic: &str, payload: &[u8]) -> Option<Publication> {
        self.reply_for(self.route(topic, payload)?)
    }

    /// Serialise a routed call into its reply publication, replacing
    /// oversized replies with an error.
    pub fn reply_for(&self, routed: RoutedCall) -> Option<Publication> {
        let Some(reply_to) = routed.reply_to else {
            warn!("VRPC: request has no sender, reply dropped");
            return None;
        };

        let mut body = routed.reply.to_json();
        if body.len() > self.max_payload_bytes {
            let err = CallError::PayloadTooLarge {
                size: body.len(),
                max: self.max_payload_bytes,
            };
            warn!("VRPC: {}", err);
            body = CallEnvelope::error_only(&err).to_json();
        }

        Some(Publication {
            topic: reply_to,
            payload: body,
            retain: false,
            qos: Qos::AtMostOnce,
        })
    }

    /// Parse, dispatch and strip one inbound message without serialising.
    pub fn route(&self, topic: &str, payload: &[u8]) -> Option<RoutedCall> {
        let Some(method_topic) = MethodTopic::parse(topic) else {
            warn!("VRPC: received invalid message on '{}'", topic);
            return None;
        };

        let mut envelope = match CallEnvelope::parse(payload) {
            Ok(env) => env,
            Err(err) => {
                warn!("VRPC: {}", err);
                return Some(RoutedCall {
                    reply_to: None,
                    reply: CallEnvelope::error_only(&err),
                    dispatched: false,
                });
            }
        };

        envelope.set_context(method_topic.context());
        envelope.set_method(method_topic.method);
        debug!("VRPC: calling {}.{}", method_topic.context(), method_topic.method);

        self.registry.dispatch(&mut envelope);
        let reply_to = envelope.strip_routing();

        Some(RoutedCall {
            reply_to,
            reply: envelope,
            dispatched: true,
        })
    }

    /// Retained capability advertisement for every registered context.
    pub fn describe_capabilities(&self) -> Vec<Publication> {
        describe_capabilities(self.registry)
            .into_iter()
            .map(|info: ClassInfo| Publication {
                topic: class_info_topic(&self.domain, &self.agent_id, &info.class_name),
                payload: info.to_json(),
                retain: true,
                qos: Qos::AtLeastOnce,
            })
            .collect()
    }

    /// One topic per static method of every context.
    pub fn subscriptions(&self) -> Vec<String> {
        self.registry
            .contexts()
            .flat_map(|context| {
                self.registry.methods(context).map(move |method| {
                    static_method_topic(&self.domain, &self.agent_id, context, method)
                })
            })
            .collect()
    }
}
