//! Request command codes. Ported from the `case 0x40..0x58` dispatch in
//! `driver/serremote.c`; only 0x40..=0x50 are implemented server-side
//! (0x51..=0x58 fall through to the original's default no-op branch and
//! have no wire records here). `Seek` (0x4e) never reaches the wire: the
//! driver resolves it locally against the FCB's own position/size fields
//! (spec.md S4.3), so it has no `cmd_seek`/`res_seek` pair in this crate.

use binrw::prelude::*;

#[binrw]
#[brw(big, repr(u8))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Check = 0x40,
    Chdir = 0x41,
    Mkdir = 0x42,
    Rmdir = 0x43,
    Rename = 0x44,
    Delete = 0x45,
    Chmod = 0x46,
    Files = 0x47,
    Nfiles = 0x48,
    Create = 0x49,
    Open = 0x4a,
    Close = 0x4b,
    Read = 0x4c,
    Write = 0x4d,
    Seek = 0x4e,
    Filedate = 0x4f,
    Dskfre = 0x50,
}
