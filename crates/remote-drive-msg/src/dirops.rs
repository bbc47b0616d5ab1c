//! Check, chdir/mkdir/rmdir/delete, rename and chmod requests/responses.
//!
//! Ported from `cmd_dirop`/`res_dirop`, `cmd_rename`/`res_rename` and
//! `cmd_chmod`/`res_chmod` in `x68kremote.h`. `chdir`/`mkdir`/`rmdir`/
//! `delete` share one wire shape (a command byte plus a path), so they
//! share `PathRequest`/`PathResponse` here instead of four near-identical
//! structs - the command byte itself (not the Rust type) is what the
//! dispatcher keys on, exactly as the original's `cmd_dirop` is reused
//! across `op_chdir`/`op_mkdir`/`op_rmdir`/`op_delete`.

use binrw::prelude::*;
use remote_drive_msg_derive::record;

use crate::command::Command;
use crate::namebuf::NameBuf;

#[record(size = 1)]
pub struct CheckRequest {
    pub command: Command,
}

#[record(size = 1)]
pub struct CheckResponse {
    pub res: i8,
}

#[record(size = 89)]
pub struct PathRequest {
    pub command: Command,
    pub path: NameBuf,
}

#[record(size = 1)]
pub struct PathResponse {
    pub res: i8,
}

#[record(size = 177)]
pub struct RenameRequest {
    pub command: Command,
    pub path_old: NameBuf,
    pub path_new: NameBuf,
}

#[record(size = 1)]
pub struct RenameResponse {
    pub res: i8,
}

#[record(size = 90)]
pub struct ChmodRequest {
    pub command: Command,
    pub attr: u8,
    pub path: NameBuf,
}

#[record(size = 1)]
pub struct ChmodResponse {
    /// The *previous* attribute on success (the original attribute the
    /// file had before any requested change was applied), or a negative
    /// `HumanError` code. `op_chmod`'s get-then-optionally-set shape.
    pub res: i8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn check_request_is_one_byte() {
        let req = CheckRequest {
            command: Command::Check,
        };
        let mut buf = Vec::new();
        req.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf, vec![0x40]);
    }

    #[test]
    fn path_request_round_trips() {
        let req = PathRequest {
            command: Command::Mkdir,
            path: NameBuf {
                flag: 0,
                drive: 0,
                path: Default::default(),
                name1: Default::default(),
                ext: Default::default(),
                name2: Default::default(),
            },
        };
        let mut buf = Vec::new();
        req.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), PathRequest::ENCODED_SIZE);
    }
}
