//! Transport-level error taxonomy.
//!
//! Splits the frame receiver's three failure modes (timeout, framing,
//! overrun - spec.md S4.1/S7) from a plain host I/O error, since only
//! the first three arm the client's recovery mode.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("receive timed out")]
    Timeout,

    #[error("framing error: expected 'X' after a run of 'Z' bytes, got {0:#04x}")]
    Framing(u8),

    #[error("frame length {len} exceeds receive buffer of {cap} bytes")]
    Overrun { len: usize, cap: usize },

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True for the three conditions that arm the client's recovery mode
    /// (spec.md S4.1 "Recovery").
    pub fn triggers_recovery(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout | TransportError::Framing(_) | TransportError::Overrun { .. }
        )
    }
}

/// Maps a raw I/O error to [`TransportError`], distinguishing a
/// configured read timeout (`ErrorKind::TimedOut`) from any other I/O
/// failure.
pub fn map_io_err(err: std::io::Error) -> TransportError {
    if err.kind() == std::io::ErrorKind::TimedOut {
        TransportError::Timeout
    } else {
        TransportError::Io(err)
    }
}
