//! Unified error types for the VRPC agent.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they can
//! be passed through the lifecycle state machine without allocation.
//!
//! Errors that travel back to a remote caller (routing misses, malformed
//! envelopes) are not represented here: they are written into the reply
//! envelope as text, see [`crate::rpc::envelope::CallError`].

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level agent error
// ---------------------------------------------------------------------------

/// Every fallible local operation in the agent funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An [`InlineCallable`](crate::rpc::inline::InlineCallable) was invoked
    /// while holding no callable (default-constructed or moved-from).
    InvalidState,
    /// A broker/transport operation failed.
    Comms(CommsError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState => write!(f, "invalid state: callable is empty"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Session establishment was refused or timed out.
    ConnectFailed,
    /// The broker session dropped.
    Disconnected,
    PublishFailed,
    SubscribeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "MQTT connect failed"),
            Self::Disconnected => write!(f, "MQTT disconnected"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::SubscribeFailed => write!(f, "MQTT subscribe failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Agent-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
