//! Call targets: one stored callable behind a uniform envelope interface.
//!
//! The registry holds targets of every arity and return type side by side
//! as `Box<dyn CallTarget>`. Each target runs the same three steps:
//!
//! 1. decode the envelope's argument array into the typed tuple,
//! 2. invoke the inline callable,
//! 3. write the outcome back into the envelope.
//!
//! [`ValueTarget`] writes the encoded return value into `"r"`;
//! [`VoidTarget`] writes an explicit `null` ("succeeded, no value").

use serde::Serialize;
use serde_json::Value;

use super::args::{ArgTuple, decode_args, encode_result};
use super::envelope::{CallEnvelope, CallError};
use super::inline::{Callable, InlineCallable};

/// Uniform capability the registry dispatches through.
pub trait CallTarget {
    /// Decode arguments, invoke, and record the outcome in `envelope`.
    fn invoke_from_envelope(&self, envelope: &mut CallEnvelope);

    /// Number of positional arguments the target consumes.
    fn arity(&self) -> usize;

    /// `false` for targets registered without a return value.
    fn returns_value(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Value-returning target
// ───────────────────────────────────────────────────────────────

pub struct ValueTarget<Args, R> {
    callable: InlineCallable<Args, R>,
}

impl<Args, R> ValueTarget<Args, R>
where
    Args: ArgTuple,
    R: Serialize,
{
    pub fn new<F>(f: F) -> Self
    where
        F: Callable<Args, Output = R> + 'static,
    {
        Self {
            callable: InlineCallable::new(f),
        }
    }
}

impl<Args, R> CallTarget for ValueTarget<Args, R>
where
    Args: ArgTuple,
    R: Serialize,
{
    fn invoke_from_envelope(&self, envelope: &mut CallEnvelope) {
        let args = decode_args::<Args>(envelope.args());
        match self.callable.invoke(args) {
            Ok(result) => match encode_result(&result) {
                Ok(value) => envelope.set_result(value),
                Err(e) => envelope.set_error(&CallError::Encode(e.to_string())),
            },
            Err(_) => envelope.set_error(&CallError::EmptyTarget),
        }
    }

    fn arity(&self) -> usize {
        Args::ARITY
    }

    fn returns_value(&self) -> bool {
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Void target
// ───────────────────────────────────────────────────────────────

pub struct VoidTarget<Args> {
    callable: InlineCallable<Args, ()>,
}

impl<Args: ArgTuple> VoidTarget<Args> {
    pub fn new<F>(f: F) -> Self
    where
        F: Callable<Args, Output = ()> + 'static,
    {
        Self {
            callable: InlineCallable::new(f),
        }
    }
}

impl<Args: ArgTuple> CallTarget for VoidTarget<Args> {
    fn invoke_from_envelope(&self, envelope: &mut CallEnvelope) {
        let args = decode_args::<Args>(envelope.args());
        match self.callable.invoke(args) {
            Ok(()) => envelope.set_result(Value::Null),
            Err(_) => envelope.set_error(&CallError::EmptyTarget),
        }
    }

    fn arity(&self) -> usize {
        Args::ARITY
    }

    fn returns_value(&self) -> bool {
        false
    }
}
