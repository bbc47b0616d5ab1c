//! The `ZZX` frame layer (spec.md S4.1) and the byte-stream backends that
//! carry it: a real serial port for production, and an in-memory pipe
//! pair for tests and local simulation.

#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod pipe;
pub mod serial;

pub use error::TransportError;
pub use frame::{FrameChannel, MAX_PAYLOAD, RECOVERY_FLOOD_LEN, recv_frame, send_frame};
pub use pipe::{PipeEnd, pipe_pair};
pub use serial::{BAUD_RATES, DEFAULT_BAUD, SerialTransport};
