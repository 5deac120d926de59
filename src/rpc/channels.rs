//! Inbound message queue between the MQTT client callback and the agent loop.
//!
//! The ESP-IDF MQTT client delivers events on its own task. The callback
//! copies each message into fixed buffers and pushes it here; the agent
//! drains one message per tick.
//!
//! ```text
//! ┌──────────────┐ InboundMessage ┌──────────────┐
//! │ MQTT client  │───────────────▶│  Agent loop  │
//! │ (callback)   │   link state   │  (sync)      │
//! └──────────────┘ ─ ─ ─ ─ ─ ─ ─▶ └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::ports::InboundMessage;

/// Channel depth for inbound messages.
const INBOUND_DEPTH: usize = 4;

/// Inbound message channel: client callback → agent loop.
pub static INBOUND_CHANNEL: Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH> =
    Channel::new();

static LINK_UP: AtomicBool = AtomicBool::new(false);

/// Queue a message from the client callback. Returns `false` when the
/// message does not fit the fixed buffers or the queue is full.
pub fn enqueue_inbound(topic: &str, data: &[u8]) -> bool {
    let Some(msg) = InboundMessage::new(topic, data) else {
        return false;
    };
    INBOUND_CHANNEL.try_send(msg).is_ok()
}

pub fn next_inbound() -> Option<InboundMessage> {
    INBOUND_CHANNEL.try_receive().ok()
}

/// Record broker link state as reported by the client callback.
pub fn set_link_up(up: bool) {
    LINK_UP.store(up, Ordering::Release);
}

pub fn link_up() -> bool {
    LINK_UP.load(Ordering::Acquire)
}
