//! JSON call envelope.
//!
//! Canonical wire shape (compact revision):
//!
//! ```text
//! request:  {"c": context, "f": method, "a": [arg0, ..], "s": replyTopic, ..}
//! response: {"a": [..], "r": result, ..}          on success (null for void)
//!           {"a": [..], "e": "message", ..}       on failure
//! ```
//!
//! The envelope is created per inbound message, mutated in place by the
//! registry, stripped of its routing fields and serialised as the reply.
//! Fields the agent does not know about are echoed back untouched.

use core::fmt;

use serde_json::{Map, Value};

pub const CONTEXT_KEY: &str = "c";
pub const METHOD_KEY: &str = "f";
pub const ARGS_KEY: &str = "a";
pub const SENDER_KEY: &str = "s";
pub const RESULT_KEY: &str = "r";
pub const ERROR_KEY: &str = "e";

// ---------------------------------------------------------------------------
// Caller-visible errors
// ---------------------------------------------------------------------------

/// Failures reported to the remote caller through the `"e"` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    ContextNotFound(String),
    MethodNotFound(String),
    /// The payload is not valid JSON.
    Parse(String),
    /// The payload is valid JSON but not an object.
    NotAnObject,
    /// The call result could not be encoded as JSON.
    Encode(String),
    /// The registered target holds no callable.
    EmptyTarget,
    PayloadTooLarge { size: usize, max: usize },
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextNotFound(ctx) => write!(f, "Could not find context: {ctx}"),
            Self::MethodNotFound(method) => write!(f, "Could not find function: {method}"),
            Self::Parse(detail) => write!(f, "JSON parsing failed because: {detail}"),
            Self::NotAnObject => write!(f, "Envelope must be a JSON object"),
            Self::Encode(detail) => write!(f, "Result encoding failed because: {detail}"),
            Self::EmptyTarget => write!(f, "Function has no callable attached"),
            Self::PayloadTooLarge { size, max } => write!(
                f,
                "Response exceeds maximum payload size ({size} > {max} bytes)"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// CallEnvelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallEnvelope {
    fields: Map<String, Value>,
}

impl CallEnvelope {
    /// Build a request envelope locally.
    pub fn request(context: &str, method: &str, args: Vec<Value>) -> Self {
        let mut env = Self::default();
        env.set_context(context);
        env.set_method(method);
        env.fields.insert(ARGS_KEY.to_string(), Value::Array(args));
        env
    }

    /// Parse an inbound payload. Only JSON objects are envelopes.
    pub fn parse(payload: &[u8]) -> Result<Self, CallError> {
        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(_) => Err(CallError::NotAnObject),
            Err(e) => Err(CallError::Parse(e.to_string())),
        }
    }

    /// An envelope carrying nothing but an error.
    pub fn error_only(err: &CallError) -> Self {
        let mut env = Self::default();
        env.set_error(err);
        env
    }

    // ── Routing fields ────────────────────────────────────────

    /// Context name, empty when absent or not a string.
    pub fn context(&self) -> &str {
        self.str_field(CONTEXT_KEY).unwrap_or_default()
    }

    /// Method name, empty when absent or not a string.
    pub fn method(&self) -> &str {
        self.str_field(METHOD_KEY).unwrap_or_default()
    }

    pub fn sender(&self) -> Option<&str> {
        self.str_field(SENDER_KEY)
    }

    pub fn set_context(&mut self, context: &str) {
        self.fields
            .insert(CONTEXT_KEY.to_string(), Value::from(context));
    }

    pub fn set_method(&mut self, method: &str) {
        self.fields.insert(METHOD_KEY.to_string(), Value::from(method));
    }

    /// Raw argument value (normally an array).
    pub fn args(&self) -> Option<&Value> {
        self.fields.get(ARGS_KEY)
    }

    /// Remove the routing-only fields, returning the reply topic if the
    /// sender field held a non-empty string.
    pub fn strip_routing(&mut self) -> Option<String> {
        self.fields.remove(CONTEXT_KEY);
        self.fields.remove(METHOD_KEY);
        match self.fields.remove(SENDER_KEY) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    // ── Outcome ───────────────────────────────────────────────

    pub fn set_result(&mut self, value: Value) {
        self.fields.remove(ERROR_KEY);
        self.fields.insert(RESULT_KEY.to_string(), value);
    }

    pub fn set_error(&mut self, err: &CallError) {
        self.fields.remove(RESULT_KEY);
        self.fields
            .insert(ERROR_KEY.to_string(), Value::from(err.to_string()));
    }

    pub fn result(&self) -> Option<&Value> {
        self.fields.get(RESULT_KEY)
    }

    pub fn error(&self) -> Option<&str> {
        self.str_field(ERROR_KEY)
    }

    // ── Serialisation ─────────────────────────────────────────

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_json(&self) -> String {
        // A map of JSON values has no unserialisable leaves.
        serde_json::to_string(&self.fields).unwrap_or_default()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}
