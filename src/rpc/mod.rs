//! Remote call subsystem.
//!
//! JSON call envelopes arrive over MQTT, are routed by topic to a
//! registered function, and the reply is published to the caller's topic.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RPC Stack                             │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐   │
//! │  │  Topic   │──▶│ Envelope │──▶│ Registry (dispatch)   │   │
//! │  │ (parse)  │   │  (JSON)  │   │  → CallTarget         │   │
//! │  └──────────┘   └──────────┘   └───────────────────────┘   │
//! │       ▲                                    │               │
//! │       │ Router                             ▼               │
//! │  ┌──────────┐                    ┌───────────────────┐     │
//! │  │ channels │                    │ args / inline     │     │
//! │  │ (queue)  │                    │ (decode, invoke)  │     │
//! │  └──────────┘                    └───────────────────┘     │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod args;
pub mod channels;
pub mod discovery;
pub mod envelope;
pub mod inline;
pub mod registry;
pub mod router;
pub mod target;
pub mod topic;
