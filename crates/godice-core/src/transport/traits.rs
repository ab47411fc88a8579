//! Bluetooth transport abstraction.
//!
//! Discovery, connection handling and characteristic scheduling belong to
//! the host platform. This trait is the seam where encoded commands leave
//! the core.

use thiserror::Error;

use crate::events::DieId;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Die {0} is not connected")]
    NotConnected(DieId),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Write side of a die connection.
///
/// Implementations write `packet` verbatim to the die's write
/// characteristic with no extra framing.
pub trait DieTransport: Send + Sync {
    /// Write one packet. Returns the number of bytes written.
    fn write(&self, die: DieId, packet: &[u8]) -> Result<usize, TransportError>;

    /// Whether `die` can currently accept writes.
    fn is_connected(&self, die: DieId) -> bool;
}
