//! Two-level function registry: `context → method → target`.
//!
//! The registry is an explicit object owned by the application and lent to
//! the router. It is filled during start-up and read-only afterwards, so it
//! carries no locking. Ordered maps keep discovery output deterministic,
//! since capability advertisements are observed by remote tooling.

use core::fmt;
use std::collections::BTreeMap;

use log::warn;

use super::envelope::{CallEnvelope, CallError};
use super::target::CallTarget;

/// Context for functions not bound to a class.
pub const GLOBAL_CONTEXT: &str = "__global__";

type MethodTable = BTreeMap<String, Box<dyn CallTarget>>;

#[derive(Default)]
pub struct Registry {
    contexts: BTreeMap<String, MethodTable>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `target` under `(context, method)`.
    ///
    /// Re-registering an existing pair replaces the previous target (last
    /// registration wins). Returns `true` when something was replaced.
    pub fn register<T>(&mut self, context: &str, method: &str, target: T) -> bool
    where
        T: CallTarget + 'static,
    {
        let replaced = self
            .contexts
            .entry(context.to_string())
            .or_default()
            .insert(method.to_string(), Box::new(target))
            .is_some();
        if replaced {
            warn!("VRPC: replaced registration {}.{}", context, method);
        }
        replaced
    }

    /// Register a function in the [`GLOBAL_CONTEXT`].
    pub fn register_global<T>(&mut self, method: &str, target: T) -> bool
    where
        T: CallTarget + 'static,
    {
        self.register(GLOBAL_CONTEXT, method, target)
    }

    /// Route `envelope` to its target.
    ///
    /// The context is resolved before the method, so an envelope missing
    /// both reports the context.
    pub fn dispatch(&self, envelope: &mut CallEnvelope) {
        let Some(methods) = self.contexts.get(envelope.context()) else {
            let err = CallError::ContextNotFound(envelope.context().to_string());
            warn!("VRPC: {}", err);
            envelope.set_error(&err);
            return;
        };
        let Some(target) = methods.get(envelope.method()) else {
            let err = CallError::MethodNotFound(envelope.method().to_string());
            warn!("VRPC: {}", err);
            envelope.set_error(&err);
            return;
        };
        target.invoke_from_envelope(envelope);
    }

    /// Registered contexts in key order.
    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    /// Methods of `context` in key order; empty for an unknown context.
    pub fn methods<'a>(&'a self, context: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.contexts
            .get(context)
            .into_iter()
            .flat_map(|methods| methods.keys().map(String::as_str))
    }

    pub fn contains(&self, context: &str, method: &str) -> bool {
        self.target(context, method).is_some()
    }

    pub fn target(&self, context: &str, method: &str) -> Option<&dyn CallTarget> {
        self.contexts
            .get(context)
            .and_then(|methods| methods.get(method))
            .map(|t| &**t)
    }

    /// Total number of registered methods across all contexts.
    pub fn len(&self) -> usize {
        self.contexts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (context, methods) in &self.contexts {
            map.entry(context, &methods.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}
