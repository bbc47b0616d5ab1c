//! The `ZZX` byte-stuffed frame layer (spec.md S4.1).
//!
//! Ported from `serout`/`serin` in `driver/serremote.c` and
//! `service/x68kremote.c`: a frame is a run of `'Z'` bytes terminated by
//! `'X'`, a big-endian 16-bit length, then that many payload bytes. Any
//! number of extra leading `'Z'` bytes - including zero extra, i.e. the
//! minimal `"ZZX"` - are accepted, which is what lets a flood of `'Z'`
//! bytes resynchronize a desynced receiver.

use std::io::{Read, Write};

use crate::error::{TransportError, map_io_err};

/// Maximum payload a single frame carries: 1024 data bytes plus up to 6
/// bytes of fixed command header (spec.md S6).
pub const MAX_PAYLOAD: usize = 1030;

/// Recovery flood length: large enough that even a receiver mid-way
/// through reading a maximum-length payload still sees enough trailing
/// `'Z'` bytes to fall back into the "scanning for Z" state (spec.md
/// S4.1). `MAX_PAYLOAD` plus the 5-byte frame header covers the worst
/// case of a receiver that has just consumed the header and is one byte
/// into the payload.
pub const RECOVERY_FLOOD_LEN: usize = MAX_PAYLOAD + 5;

fn read_byte<R: Read>(r: &mut R) -> Result<u8, TransportError> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b).map_err(map_io_err)?;
    Ok(b[0])
}

/// Receives one frame's payload into `buf`, returning the number of
/// bytes written. Implements the receiver algorithm of spec.md S4.1
/// exactly: discard until `'Z'`, consume the run of `'Z'`s, require
/// `'X'`, read a big-endian length, then read exactly that many bytes.
pub fn recv_frame<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, TransportError> {
    let mut b = read_byte(r)?;
    while b != b'Z' {
        b = read_byte(r)?;
    }
    loop {
        b = read_byte(r)?;
        if b != b'Z' {
            break;
        }
    }
    if b != b'X' {
        return Err(TransportError::Framing(b));
    }

    let mut len_bytes = [0u8; 2];
    r.read_exact(&mut len_bytes).map_err(map_io_err)?;
    let len = (len_bytes[0] as usize) << 8 | len_bytes[1] as usize;

    if len > buf.len() {
        return Err(TransportError::Overrun {
            len,
            cap: buf.len(),
        });
    }

    r.read_exact(&mut buf[..len]).map_err(map_io_err)?;
    Ok(len)
}

/// Writes one frame: the `"ZZX"` preamble, a big-endian length, and the
/// payload. Does not implement recovery flooding - see [`FrameChannel`]
/// for the stateful sender that does.
pub fn send_frame<W: Write>(w: &mut W, payload: &[u8]) -> Result<(), TransportError> {
    debug_assert!(payload.len() <= MAX_PAYLOAD, "payload exceeds MAX_PAYLOAD");
    w.write_all(b"ZZX").map_err(map_io_err)?;
    let len = payload.len();
    w.write_all(&[(len >> 8) as u8, (len & 0xff) as u8])
        .map_err(map_io_err)?;
    w.write_all(payload).map_err(map_io_err)?;
    Ok(())
}

/// A framed duplex channel over any blocking byte stream, tracking the
/// sender-side recovery mode of spec.md S4.1.
///
/// The server side never needs an explicit recovery flag: its own
/// receiver self-recovers per the same framing rule, so `FrameChannel`
/// on the service end simply never enters recovery (nothing ever calls
/// [`FrameChannel::enter_recovery`] there).
pub struct FrameChannel<T> {
    io: T,
    recovering: bool,
}

impl<T: Read + Write> FrameChannel<T> {
    pub fn new(io: T) -> Self {
        FrameChannel {
            io,
            recovering: false,
        }
    }

    pub fn into_inner(self) -> T {
        self.io
    }

    /// True after the last [`FrameChannel::recv`] failed with an error
    /// that arms recovery (spec.md S4.1).
    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    pub fn enter_recovery(&mut self) {
        self.recovering = true;
    }

    /// Sends one frame, first flooding the line with `'Z'` bytes if a
    /// prior receive left the channel in recovery mode.
    ///
    /// The literal "drain any inbound bytes concurrently" wording of
    /// spec.md S4.1 describes a full-duplex implementation; under the
    /// strict request/response lockstep this workspace implements (S5:
    /// at most one frame in flight in either direction), the peer is
    /// always blocked in its own receive loop by the time recovery is
    /// entered, so there is nothing pending to drain - the flood alone
    /// is sufficient.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.recovering {
            let flood = [b'Z'; RECOVERY_FLOOD_LEN];
            self.io.write_all(&flood).map_err(map_io_err)?;
            self.recovering = false;
        }
        send_frame(&mut self.io, payload)
    }

    /// Receives one frame. On any framing/timeout/overrun error, arms
    /// recovery mode for the next [`FrameChannel::send`] and propagates
    /// the error to the caller (the dispatcher reports the current
    /// operation as failed).
    pub fn recv<'b>(&mut self, buf: &'b mut [u8]) -> Result<&'b [u8], TransportError> {
        match recv_frame(&mut self.io, buf) {
            Ok(n) => Ok(&buf[..n]),
            Err(e) => {
                if e.triggers_recovery() {
                    self.recovering = true;
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn recv_accepts_minimal_preamble() {
        let wire = b"ZZX\x00\x03abc";
        let mut buf = [0u8; 16];
        let n = recv_frame(&mut Cursor::new(wire.as_slice()), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"abc");
    }

    #[test]
    fn recv_discards_leading_garbage_and_extra_z_runs() {
        let wire = b"\x01\x02ZZZZZZX\x00\x02hi";
        let mut buf = [0u8; 16];
        let n = recv_frame(&mut Cursor::new(wire.as_slice()), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hi");
    }

    #[test]
    fn recv_rejects_non_x_after_z_run() {
        let wire = b"ZZY\x00\x00";
        let mut buf = [0u8; 16];
        let err = recv_frame(&mut Cursor::new(wire.as_slice()), &mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Framing(b'Y')));
    }

    #[test]
    fn recv_rejects_oversized_length() {
        let wire = b"ZZX\x00\x05ab";
        let mut buf = [0u8; 16];
        let err = recv_frame(&mut Cursor::new(wire.as_slice()), &mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn recv_rejects_length_over_buffer_capacity() {
        let wire = b"ZZX\x00\x04abcd";
        let mut buf = [0u8; 2];
        let err = recv_frame(&mut Cursor::new(wire.as_slice()), &mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Overrun { len: 4, cap: 2 }));
    }

    #[test]
    fn send_frame_round_trips() {
        let mut buf = Vec::new();
        send_frame(&mut buf, b"payload").unwrap();
        assert_eq!(buf, b"ZZX\x00\x07payload");
    }

    #[test]
    fn channel_recv_error_arms_recovery_and_flood_precedes_next_send() {
        // A bad frame (wrong byte after the Z run) followed by a clean
        // frame for the *next* recv, simulating a fresh request after
        // the driver has recovered.
        let input = Cursor::new(b"ZZY\x00\x00ZZX\x00\x02hi".to_vec());
        let mut out = Vec::new();
        let mut chan = FrameChannel::new(ReadWritePair {
            r: input,
            w: &mut out,
        });
        let mut buf = [0u8; 16];
        assert!(chan.recv(&mut buf).is_err());
        assert!(chan.is_recovering());
        chan.send(b"ping").unwrap();
        assert!(!chan.is_recovering());
        assert!(out.len() >= RECOVERY_FLOOD_LEN);
        assert_eq!(&out[out.len() - 9..], b"ZZX\x00\x04ping");
    }

    struct ReadWritePair<'a, R> {
        r: R,
        w: &'a mut Vec<u8>,
    }

    impl<R: Read> Read for ReadWritePair<'_, R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.r.read(buf)
        }
    }

    impl<R> Write for ReadWritePair<'_, R> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.w.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.w.flush()
        }
    }
}
