//! Wire records for the remote-drive protocol: the command byte, the
//! 88-byte name buffer, and every `cmd_*`/`res_*` pair the service
//! dispatcher recognizes (spec.md S4.2).
//!
//! Every record here round-trips through `binrw` in big-endian byte
//! order. Fixed-size records go through the `#[record(size = N)]` helper
//! macro from `remote_drive_msg_derive`; `read`/`write`, whose payload
//! length varies, are hand-written `#[binrw]` structs instead.

pub mod command;
pub mod dirops;
pub mod fileops;
pub mod namebuf;

pub use command::Command;
pub use dirops::*;
pub use fileops::*;
pub use namebuf::{NAMEBUF_SIZE, NameBuf};
