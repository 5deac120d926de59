//! Fuzz target: `Router::on_inbound_message`
//!
//! Splits the input into a topic and a payload at the first NUL byte and
//! routes it against a small registry. Asserts that routing never panics
//! and that any reply respects the configured payload limit.
//!
//! cargo fuzz run fuzz_router

#![no_main]

use libfuzzer_sys::fuzz_target;
use vrpc_agent::rpc::registry::Registry;
use vrpc_agent::rpc::router::Router;
use vrpc_agent::rpc::target::{ValueTarget, VoidTarget};

const MAX_PAYLOAD: usize = 256;

fuzz_target!(|data: &[u8]| {
    let (topic, payload) = match data.iter().position(|&b| b == 0) {
        Some(i) => (&data[..i], &data[i + 1..]),
        None => (&b"d/a/__global__/__static__/add"[..], data),
    };
    let Ok(topic) = core::str::from_utf8(topic) else {
        return;
    };

    let mut registry = Registry::new();
    registry.register_global("add", ValueTarget::new(|a: i64, b: i64| a.wrapping_add(b)));
    registry.register_global("echo", ValueTarget::new(|s: String| s));
    registry.register_global("noop", VoidTarget::new(|| {}));

    let router = Router::new(&registry, "d", "a", MAX_PAYLOAD);
    if let Some(reply) = router.on_inbound_message(topic, payload) {
        assert!(reply.payload.len() <= MAX_PAYLOAD, "reply exceeds payload limit");
        assert!(!reply.retain, "replies are never retained");
    }
});
