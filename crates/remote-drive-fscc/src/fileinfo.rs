//! The 32-byte directory-entry record carried by `files`/`nfiles` responses.
//!
//! Ported from `struct dos_filesinfo` in `x68kremote.h`, minus its leading
//! `dummy` byte (an artifact of that struct doing double duty as a raw
//! Human68k `FILBUF` entry on the client side, which this workspace's wire
//! format has no need to mirror).

use binrw::prelude::*;

use crate::attr::FileAttr;

/// One directory entry: attribute, packed time/date, length, and an
/// 8.3-or-longer Shift-JIS name, NUL-terminated within its 23-byte field.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub attr: FileAttr,
    pub time: u16,
    pub date: u16,
    pub file_len: u32,
    pub name: [u8; 23],
}

impl FileInfo {
    pub const ENCODED_SIZE: usize = 32;

    /// Builds a record from a Shift-JIS name, truncating/zero-padding to
    /// the 23-byte field the client expects.
    pub fn new(attr: FileAttr, time: u16, date: u16, file_len: u32, name_sjis: &[u8]) -> Self {
        let mut name = [0u8; 23];
        let len = name_sjis.len().min(22); // always leave room for the NUL
        name[..len].copy_from_slice(&name_sjis[..len]);
        FileInfo {
            attr,
            time,
            date,
            file_len,
            name,
        }
    }

    /// The synthetic root volume-label entry (`op_files`'s volume-label
    /// branch): zero time/date/length, the `volume` attribute bit set.
    pub fn volume_label(name_sjis: &[u8]) -> Self {
        FileInfo::new(FileAttr::new().with_volume(true), 0, 0, 0, name_sjis)
    }

    pub fn name_sjis(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        &self.name[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn encodes_to_32_bytes() {
        let info = FileInfo::new(FileAttr::new().with_archive(true), 0, 0, 123, b"HELLO.TXT");
        let mut buf = Vec::new();
        info.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), FileInfo::ENCODED_SIZE);
    }

    #[test]
    fn name_sjis_stops_at_nul() {
        let info = FileInfo::new(FileAttr::new(), 0, 0, 0, b"A.TXT");
        assert_eq!(info.name_sjis(), b"A.TXT");
    }
}
