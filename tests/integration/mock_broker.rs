//! Mock broker and clock for integration tests.
//!
//! Records every session, publish and subscribe so tests can assert on the
//! full history without a network.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use vrpc_agent::app::ports::{BrokerPort, ClockPort, InboundMessage, Qos, SessionOptions};

// ── Publish record ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
    pub qos: Qos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

// ── MockBroker ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBroker {
    /// Number of upcoming connect attempts that fail.
    pub fail_connects: u32,
    /// Fail the next publish.
    pub fail_publish: bool,
    /// Fail the next poll.
    pub fail_poll: bool,
    pub connected: bool,
    pub sessions: Vec<SessionOptions>,
    pub connect_attempts_at: Vec<u64>,
    pub published: Vec<Published>,
    pub subscribed: Vec<String>,
    pub inbox: VecDeque<InboundMessage>,
    clock: Option<ManualClock>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the clock time of each connect attempt.
    pub fn with_clock(clock: &ManualClock) -> Self {
        Self {
            clock: Some(clock.clone()),
            ..Self::default()
        }
    }

    pub fn deliver(&mut self, topic: &str, payload: &str) {
        let msg = InboundMessage::new(topic, payload.as_bytes()).expect("message fits buffers");
        self.inbox.push_back(msg);
    }

    pub fn published_to(&self, topic: &str) -> Vec<&Published> {
        self.published.iter().filter(|p| p.topic == topic).collect()
    }

    pub fn drop_link(&mut self) {
        self.connected = false;
    }
}

impl BrokerPort for MockBroker {
    type Error = MockError;

    fn connect(&mut self, options: &SessionOptions) -> Result<(), MockError> {
        if let Some(clock) = &self.clock {
            self.connect_attempts_at.push(clock.now_ms());
        }
        self.sessions.push(options.clone());
        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            return Err(MockError);
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str, _qos: Qos) -> Result<(), MockError> {
        if !self.connected {
            return Err(MockError);
        }
        self.subscribed.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool, qos: Qos) -> Result<(), MockError> {
        if !self.connected || core::mem::take(&mut self.fail_publish) {
            return Err(MockError);
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            retain,
            qos,
        });
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, MockError> {
        if core::mem::take(&mut self.fail_poll) {
            return Err(MockError);
        }
        Ok(self.inbox.pop_front())
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock advanced explicitly by the test; clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
