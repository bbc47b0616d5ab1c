//! Serial-port backend, used by the driver side in production and by the
//! service binary when it is pointed at a real device (spec.md S6's
//! `service <serial-device>` argument).

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::TransportError;

/// Wraps a [`serialport::SerialPort`] so it can back a [`crate::frame::FrameChannel`].
///
/// `serialport`'s own configured read timeout is what turns a stalled
/// receive into `std::io::ErrorKind::TimedOut`, which
/// [`crate::error::map_io_err`] maps to [`TransportError::Timeout`] -
/// this type does no timing of its own.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens `path` at `baud_rate`, configuring the port's read timeout
    /// to `timeout` (the driver's `t<tenths>` install parameter, spec.md
    /// S6, converted to a [`Duration`] by the caller).
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| TransportError::Io(std::io::Error::other(e)))?;
        Ok(SerialTransport { port })
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

/// Recognized `-s <baud>` values (spec.md S6); `38400` is the default.
pub const BAUD_RATES: &[u32] = &[
    75, 150, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400,
];

pub const DEFAULT_BAUD: u32 = 38400;
