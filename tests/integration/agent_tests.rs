//! Integration tests for the agent lifecycle: connect/retry, presence,
//! capability advertisement, and the call loop over a mock broker.

use super::mock_broker::{ManualClock, MockBroker};

use serde_json::{Value, json};
use vrpc_agent::agent::{Agent, AgentIdentity, AgentState};
use vrpc_agent::app::ports::Qos;
use vrpc_agent::config::AgentConfig;
use vrpc_agent::rpc::registry::Registry;
use vrpc_agent::rpc::target::{ValueTarget, VoidTarget};

const PRESENCE: &str = "public.vrpc/espdeadbeefcafe/__agentInfo__";
const CLASS_INFO: &str = "public.vrpc/espdeadbeefcafe/__global__/__classInfo__";
const ADD: &str = "public.vrpc/espdeadbeefcafe/__global__/__static__/add";

fn registry() -> Registry {
    let mut r = Registry::new();
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));
    r.register_global("ledOn", VoidTarget::new(|| {}));
    r
}

fn identity(config: &AgentConfig) -> AgentIdentity {
    AgentIdentity::with_build_timestamp(config, "espdeadbeefcafe", "vrpc-agent-efcafe", "1700000000")
}

fn make_agent<'r>(
    registry: &'r Registry,
    broker: MockBroker,
    clock: &ManualClock,
) -> Agent<'r, MockBroker, ManualClock> {
    let config = AgentConfig::default();
    Agent::new(registry, &config, identity(&config), broker, clock.clone()).unwrap()
}

fn payload(p: &str) -> Value {
    serde_json::from_str(p).unwrap()
}

// ── Retry at the fixed interval, announce once ───────────────

#[test]
fn three_failures_then_success_announces_once() {
    let r = registry();
    let clock = ManualClock::new();
    let mut broker = MockBroker::with_clock(&clock);
    broker.fail_connects = 3;
    let mut agent = make_agent(&r, broker, &clock);

    // Tick every 100 ms for 20 s.
    for _ in 0..200 {
        agent.tick();
        clock.advance(100);
    }

    assert_eq!(agent.state(), AgentState::Connected);
    assert_eq!(agent.stats().connect_attempts, 4);
    assert_eq!(agent.broker().connect_attempts_at, vec![0, 5_000, 10_000, 15_000]);
    assert_eq!(agent.broker().published_to(PRESENCE).len(), 1);
    assert_eq!(agent.broker().published_to(CLASS_INFO).len(), 1);
}

#[test]
fn nothing_published_while_connect_fails() {
    let r = registry();
    let clock = ManualClock::new();
    let mut broker = MockBroker::new();
    broker.fail_connects = u32::MAX;
    let mut agent = make_agent(&r, broker, &clock);

    for _ in 0..10 {
        agent.tick();
        clock.advance(5_000);
    }
    assert_eq!(agent.state(), AgentState::Disconnected);
    assert_eq!(agent.stats().connect_attempts, 10);
    assert!(agent.broker().published.is_empty());
    assert!(agent.broker().subscribed.is_empty());
}

// ── Announcement ─────────────────────────────────────────────

#[test]
fn announce_publishes_presence_then_capabilities_then_subscribes() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    let b = agent.broker();
    assert_eq!(b.published.len(), 2);

    assert_eq!(b.published[0].topic, PRESENCE);
    assert!(b.published[0].retain);
    assert_eq!(b.published[0].qos, Qos::AtLeastOnce);
    assert_eq!(
        payload(&b.published[0].payload),
        json!({"status": "online", "hostname": "vrpc-agent-efcafe"})
    );

    assert_eq!(b.published[1].topic, CLASS_INFO);
    assert!(b.published[1].retain);
    assert_eq!(
        payload(&b.published[1].payload),
        json!({
            "className": "__global__",
            "instances": [],
            "memberFunctions": [],
            "staticFunctions": ["add", "ledOn"]
        })
    );

    assert_eq!(
        b.subscribed,
        vec![
            ADD.to_string(),
            "public.vrpc/espdeadbeefcafe/__global__/__static__/ledOn".to_string(),
        ]
    );
}

#[test]
fn session_carries_credentials_and_last_will() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    let session = &agent.broker().sessions[0];
    assert_eq!(session.client_id, "vrpcaespdeadbeefcafe");
    assert_eq!(session.username.as_deref(), Some("vrpcaespdeadbeefcafe"));
    assert_eq!(session.password.as_deref().map(str::len), Some(16));
    assert_eq!(session.keep_alive_secs, 30);
    assert_eq!(session.last_will.topic, PRESENCE);
    assert!(session.last_will.retain);
    assert_eq!(
        payload(&session.last_will.payload),
        json!({"status": "offline", "hostname": "vrpc-agent-efcafe"})
    );
}

#[test]
fn failed_announce_disconnects_and_retries() {
    let r = registry();
    let clock = ManualClock::new();
    let mut broker = MockBroker::new();
    broker.fail_publish = true;
    let mut agent = make_agent(&r, broker, &clock);

    assert_eq!(agent.tick(), AgentState::Disconnected);
    assert!(!agent.broker().connected);

    clock.advance(5_000);
    assert_eq!(agent.tick(), AgentState::Connected);
    assert_eq!(agent.broker().published_to(PRESENCE).len(), 1);
}

// ── Call loop ────────────────────────────────────────────────

#[test]
fn inbound_call_is_answered_on_sender_topic() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    agent
        .broker_mut()
        .deliver(ADD, r#"{"a":[2,3],"s":"client/42/reply"}"#);
    agent.tick();

    let replies = agent.broker().published_to("client/42/reply");
    assert_eq!(replies.len(), 1);
    assert!(!replies[0].retain);
    assert_eq!(payload(&replies[0].payload), json!({"a": [2, 3], "r": 5}));
    assert_eq!(agent.stats().calls_dispatched, 1);
    assert_eq!(agent.stats().replies_published, 1);
}

#[test]
fn one_message_per_tick() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    agent.broker_mut().deliver(ADD, r#"{"a":[1,1],"s":"x"}"#);
    agent.broker_mut().deliver(ADD, r#"{"a":[2,2],"s":"x"}"#);
    agent.tick();
    assert_eq!(agent.broker().published_to("x").len(), 1);
    agent.tick();
    assert_eq!(agent.broker().published_to("x").len(), 2);
}

#[test]
fn reply_without_sender_is_counted_as_dropped() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();
    let before = agent.broker().published.len();

    agent.broker_mut().deliver(ADD, r#"{"a":[1,1]}"#);
    agent.tick();

    assert_eq!(agent.broker().published.len(), before);
    assert_eq!(agent.stats().calls_dispatched, 1);
    assert_eq!(agent.stats().replies_dropped, 1);
}

#[test]
fn malformed_topic_is_ignored() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();
    let before = agent.broker().published.len();

    agent
        .broker_mut()
        .deliver("public.vrpc/espdeadbeefcafe/__global__/add", r#"{"s":"x"}"#);
    agent.tick();

    assert_eq!(agent.broker().published.len(), before);
    assert_eq!(agent.stats().calls_dispatched, 0);
    assert_eq!(agent.state(), AgentState::Connected);
}

#[test]
fn failed_reply_publish_keeps_session() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    agent.broker_mut().deliver(ADD, r#"{"a":[1,1],"s":"x"}"#);
    agent.broker_mut().fail_publish = true;
    agent.tick();

    assert_eq!(agent.state(), AgentState::Connected);
    assert_eq!(agent.stats().replies_dropped, 1);
}

// ── Link loss ────────────────────────────────────────────────

#[test]
fn link_loss_reconnects_and_reannounces() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    agent.broker_mut().drop_link();
    clock.advance(100);
    assert_eq!(agent.tick(), AgentState::Disconnected);

    clock.advance(5_000);
    assert_eq!(agent.tick(), AgentState::Connected);
    assert_eq!(agent.broker().published_to(PRESENCE).len(), 2);
}

#[test]
fn poll_error_drops_session() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();

    agent.broker_mut().fail_poll = true;
    assert_eq!(agent.tick(), AgentState::Disconnected);
    assert!(!agent.broker().connected);
}

#[test]
fn shutdown_announces_offline() {
    let r = registry();
    let clock = ManualClock::new();
    let mut agent = make_agent(&r, MockBroker::new(), &clock);
    agent.tick();
    agent.shutdown();

    let presence = agent.broker().published_to(PRESENCE);
    assert_eq!(presence.len(), 2);
    assert!(presence[1].retain);
    assert_eq!(payload(&presence[1].payload)["status"], json!("offline"));
    assert_eq!(agent.state(), AgentState::Disconnected);
}
