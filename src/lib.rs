//! VRPC agent library.
//!
//! Exposes the dispatch core, lifecycle and adapters for the firmware
//! binary, integration tests and fuzzing. All ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod agent;
pub mod app;
pub mod config;
pub mod error;
pub mod rpc;
