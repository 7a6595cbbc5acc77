//! Byte-stream transport abstraction.
//!
//! The session and dispatch worker only ever talk to the device through
//! [`Transport`]; each platform provides its own implementation.

#[cfg(test)]
pub mod mock;
#[cfg(feature = "rfcomm")]
pub mod rfcomm;

use async_trait::async_trait;

use crate::error::Result;

/// A framed link to the headphones.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link to `address` on the given RFCOMM channel / port.
    async fn connect(&mut self, address: &str, port: u8) -> Result<()>;

    /// Close the link. Safe to call when already closed.
    async fn disconnect(&mut self);

    /// Write one encoded frame.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Return every complete frame that arrives within the transport's own
    /// short read timeout. Empty when nothing is pending.
    async fn receive_all(&mut self) -> Vec<Vec<u8>>;

    fn is_connected(&self) -> bool;
}
