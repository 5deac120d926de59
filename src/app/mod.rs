//! Application boundary: the port traits the agent is generic over.

pub mod ports;
