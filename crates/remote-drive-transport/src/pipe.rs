//! An in-memory duplex byte stream, used to pair a driver session and a
//! service session within one process for tests and the CLI's `sim`
//! subcommand, without needing a real serial port.

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// One end of an in-memory pipe pair. Implements `Read`/`Write` so it can
/// back a [`crate::frame::FrameChannel`] exactly like a real serial port.
pub struct PipeEnd {
    tx: Sender<u8>,
    rx: Receiver<u8>,
    timeout: Duration,
}

/// Builds two connected [`PipeEnd`]s, each configured with `timeout` as
/// its read timeout (mirroring the driver's configurable receive
/// timeout, spec.md S5).
pub fn pipe_pair(timeout: Duration) -> (PipeEnd, PipeEnd) {
    let (tx_a, rx_a) = mpsc::channel();
    let (tx_b, rx_b) = mpsc::channel();
    (
        PipeEnd {
            tx: tx_a,
            rx: rx_b,
            timeout,
        },
        PipeEnd {
            tx: tx_b,
            rx: rx_a,
            timeout,
        },
    )
}

impl Read for PipeEnd {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let first = self.rx.recv_timeout(self.timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "pipe receive timed out")
            }
            RecvTimeoutError::Disconnected => std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe peer disconnected",
            ),
        })?;
        buf[0] = first;
        let mut n = 1;
        while n < buf.len() {
            match self.rx.try_recv() {
                Ok(b) => {
                    buf[n] = b;
                    n += 1;
                }
                Err(_) => break,
            }
        }
        Ok(n)
    }
}

impl Write for PipeEnd {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &b in buf {
            self.tx
                .send(b)
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_written_on_one_end_arrive_on_the_other() {
        let (mut a, mut b) = pipe_pair(Duration::from_millis(200));
        a.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn read_times_out_when_nothing_is_written() {
        let (_a, mut b) = pipe_pair(Duration::from_millis(20));
        let mut buf = [0u8; 1];
        let err = b.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }
}
