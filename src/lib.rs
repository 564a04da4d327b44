//! Client for Poly/Ontology style blockchain nodes.
//!
//! This library provides one facade, [`services::client::ClientManager`], over the
//! three protocols a node exposes:
//!
//! - JSON-RPC over HTTP
//! - REST over HTTP
//! - WebSocket
//!
//! # Module Structure
//!
//! - `bootstrap`: Builds a client manager from configuration and runs CLI commands
//! - `models`: Chain data types and configuration
//! - `services`: Client manager, transports and reply decoders
//! - `utils`: Logging, HTTP retry and test helpers

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
