//! Core domain models shared by configuration and services.

mod transport;

pub use transport::TransportKind;
