//! Port traits: the hexagonal boundary between the agent and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Agent / Router (domain)
//! ```
//!
//! Driven adapters (MQTT client, clock) implement these traits. The
//! [`Agent`](crate::agent::Agent) consumes them via generics, so the
//! dispatch core never touches the network stack directly and can be
//! exercised on the host with mock adapters.
//!
//! ## Concurrency notes
//!
//! - Implementations are driven from a single control loop; `publish` and
//!   `subscribe` are never called reentrantly.
//! - A broker client that receives on another thread must hand messages to
//!   the loop through a queue (see [`crate::rpc::channels`]).

use core::fmt;

use crate::config::MAX_PAYLOAD_CAPACITY;

/// Longest topic the inbound queue can carry.
pub const TOPIC_CAPACITY: usize = 256;

// ───────────────────────────────────────────────────────────────
// Message types
// ───────────────────────────────────────────────────────────────

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
}

/// Broker-held message published when the session drops uncleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
    pub qos: Qos,
}

/// Everything needed to open a broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u16,
    pub last_will: LastWill,
}

/// One message delivered by the broker, stored in fixed buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<TOPIC_CAPACITY>,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_CAPACITY>,
}

impl InboundMessage {
    /// Copy `topic` and `payload` into fixed buffers. `None` if either
    /// exceeds its capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let mut p = heapless::Vec::new();
        p.extend_from_slice(payload).ok()?;
        Some(Self {
            topic: t,
            payload: p,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: agent ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Publish/subscribe session with a message broker.
pub trait BrokerPort {
    /// Error type for this transport.
    type Error: fmt::Debug;

    /// Open a session. Replaces any previous session.
    fn connect(&mut self, options: &SessionOptions) -> Result<(), Self::Error>;

    /// Close the session cleanly (the last will is not published).
    fn disconnect(&mut self);

    /// Whether the session is currently up.
    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), Self::Error>;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool, qos: Qos)
    -> Result<(), Self::Error>;

    /// Service keep-alive and return at most one inbound message.
    fn poll(&mut self) -> Result<Option<InboundMessage>, Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}
