//! Core services.
//!
//! - `client`: The client manager facade
//! - `decoder`: Decoding of node replies into domain types
//! - `transports`: RPC, REST and WebSocket transports

pub mod client;
pub mod decoder;
pub mod transports;
