//! Client manager and its error type.

mod error;
mod manager;

pub use error::ClientError;
pub use manager::{ClientManager, DEFAULT_WAIT_BLOCK_COUNT};
