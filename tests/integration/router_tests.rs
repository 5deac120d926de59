//! Integration tests for topic → envelope → registry → reply routing.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{Value, json};
use vrpc_agent::rpc::envelope::CallEnvelope;
use vrpc_agent::rpc::registry::{GLOBAL_CONTEXT, Registry};
use vrpc_agent::rpc::router::Router;
use vrpc_agent::rpc::target::{ValueTarget, VoidTarget};

const DOMAIN: &str = "public.vrpc";
const AGENT: &str = "esp01";

fn topic(class: &str, method: &str) -> String {
    format!("{DOMAIN}/{AGENT}/{class}/__static__/{method}")
}

fn reply(router: &Router<'_>, topic: &str, body: &str) -> Option<Value> {
    router
        .on_inbound_message(topic, body.as_bytes())
        .map(|p| serde_json::from_str(&p.payload).unwrap())
}

// ── Global add ───────────────────────────────────────────────

#[test]
fn global_add_returns_sum() {
    let mut r = Registry::new();
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));

    let mut env = CallEnvelope::request(GLOBAL_CONTEXT, "add", vec![json!(2), json!(3)]);
    r.dispatch(&mut env);
    assert_eq!(env.result(), Some(&json!(5)));

    let router = Router::new(&r, DOMAIN, AGENT, 1024);
    let v = reply(&router, &topic("__global__", "add"), r#"{"a":[2,3],"s":"r"}"#).unwrap();
    assert_eq!(v["r"], json!(5));
    assert!(v.get("c").is_none() && v.get("f").is_none() && v.get("s").is_none());
}

// ── Unknown method ───────────────────────────────────────────

#[test]
fn missing_method_names_it_in_error() {
    let mut r = Registry::new();
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("__global__", "missingFn"), r#"{"a":[],"s":"r"}"#).unwrap();
    assert!(v["e"].as_str().unwrap().contains("missingFn"));
    assert!(v.get("r").is_none());
}

#[test]
fn missing_context_reported_before_method() {
    let r = Registry::new();
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("Nope", "missingFn"), r#"{"s":"r"}"#).unwrap();
    assert_eq!(v["e"], json!("Could not find context: Nope"));
}

// ── Four-segment topic ───────────────────────────────────────

#[test]
fn four_segment_topic_never_dispatches() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);

    let mut r = Registry::new();
    r.register_global("ping", VoidTarget::new(move || counter.set(counter.get() + 1)));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let out = router.on_inbound_message(&format!("{DOMAIN}/{AGENT}/__global__/ping"), br#"{"s":"r"}"#);
    assert!(out.is_none());
    assert_eq!(calls.get(), 0);

    let out = router.on_inbound_message(&topic("__global__", "ping"), br#"{"s":"r"}"#);
    assert!(out.is_some());
    assert_eq!(calls.get(), 1);
}

// ── Argument handling ────────────────────────────────────────

#[test]
fn void_call_writes_null_result() {
    let mut r = Registry::new();
    r.register_global("ledOn", VoidTarget::new(|| {}));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("__global__", "ledOn"), r#"{"s":"r"}"#).unwrap();
    assert_eq!(v, json!({"r": null}));
}

#[test]
fn missing_arguments_default_to_zero() {
    let mut r = Registry::new();
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("__global__", "add"), r#"{"a":[7],"s":"r"}"#).unwrap();
    assert_eq!(v["r"], json!(7));
    let v = reply(&router, &topic("__global__", "add"), r#"{"a":["x",true],"s":"r"}"#).unwrap();
    assert_eq!(v["r"], json!(0));
}

#[test]
fn mixed_argument_types() {
    let mut r = Registry::new();
    r.register(
        "Greeter",
        "greet",
        ValueTarget::new(|name: String, times: u8, shout: bool| {
            let g = format!("hi {name}").repeat(usize::from(times));
            if shout { g.to_uppercase() } else { g }
        }),
    );
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("Greeter", "greet"), r#"{"a":["bo",2,true],"s":"r"}"#).unwrap();
    assert_eq!(v["r"], json!("HI BOHI BO"));
}

#[test]
fn six_argument_call() {
    let mut r = Registry::new();
    r.register_global(
        "sum6",
        ValueTarget::new(|a: i64, b: i64, c: i64, d: i64, e: i64, f: i64| a + b + c + d + e + f),
    );
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("__global__", "sum6"), r#"{"a":[1,2,3,4,5,6],"s":"r"}"#).unwrap();
    assert_eq!(v["r"], json!(21));
}

#[test]
fn extra_request_fields_are_echoed() {
    let mut r = Registry::new();
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let v = reply(&router, &topic("__global__", "add"), r#"{"a":[1,2],"i":"call-9","s":"r"}"#).unwrap();
    assert_eq!(v["i"], json!("call-9"));
    assert_eq!(v["r"], json!(3));
}

#[test]
fn non_object_payload_is_reported() {
    let mut r = Registry::new();
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let routed = router.route(&topic("__global__", "add"), b"[1,2]").unwrap();
    assert!(!routed.dispatched);
    assert!(routed.reply.error().is_some());
}

#[test]
fn capabilities_cover_every_context() {
    let mut r = Registry::new();
    r.register("Led", "on", VoidTarget::new(|| {}));
    r.register("Led", "off", VoidTarget::new(|| {}));
    r.register_global("add", ValueTarget::new(|a: i32, b: i32| a + b));
    let router = Router::new(&r, DOMAIN, AGENT, 1024);

    let caps = router.describe_capabilities();
    let topics: Vec<&str> = caps.iter().map(|p| p.topic.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "public.vrpc/esp01/Led/__classInfo__",
            "public.vrpc/esp01/__global__/__classInfo__",
        ]
    );
    let led: Value = serde_json::from_str(&caps[0].payload).unwrap();
    assert_eq!(led["staticFunctions"], json!(["off", "on"]));
    assert_eq!(router.subscriptions().len(), 3);
}
