//! The aggregate error type threaded through the driver dispatcher.
//!
//! Ported from the error taxonomy in spec.md S7: a protocol/transport
//! failure (framing desync, overrun, timeout) is reported to the client
//! OS as a device error distinct from the filesystem error namespace a
//! successful round trip carries in its `res` field.

use remote_drive_fscc::HumanError;
use remote_drive_transport::TransportError;
use thiserror::Error;

/// The status the driver dispatcher ultimately writes back into the
/// client OS's request-header (spec.md S7 "Propagation policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A value from the Human68k `_DOSE_*` namespace (filesystem error or
    /// a client-local decision such as `CantSeek`/`BadFileNumber`).
    Human(HumanError),
    /// A transport-layer failure: major/minor device-error bytes,
    /// `(0x10, 0x02)` for the device-timeout code spec.md S6 documents.
    Device { major: u8, minor: u8 },
}

impl Status {
    pub const DEVICE_TIMEOUT: Status = Status::Device {
        major: 0x10,
        minor: 0x02,
    };
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("remote operation failed: {0:?}")]
    Remote(HumanError),

    #[error("seek past end of file")]
    CantSeek,

    #[error("unknown file handle")]
    BadFileHandle,

    /// A response decoded to a shape the dispatcher couldn't make sense
    /// of (wrong length, unrecognized error code) - treated the same as a
    /// transport desync, since either way the two ends have lost sync on
    /// what the other one meant.
    #[error("malformed response: {0}")]
    Protocol(#[from] binrw::Error),
}

impl DriverError {
    /// What the driver dispatcher writes back into the client's FCB
    /// status field (spec.md S7).
    pub fn status(&self) -> Status {
        match self {
            DriverError::Transport(_) => Status::DEVICE_TIMEOUT,
            DriverError::Protocol(_) => Status::DEVICE_TIMEOUT,
            DriverError::Remote(e) => Status::Human(*e),
            DriverError::CantSeek => Status::Human(HumanError::CantSeek),
            DriverError::BadFileHandle => Status::Human(HumanError::BadFileNumber),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
