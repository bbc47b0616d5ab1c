//! The 88-byte `dos_namebuf` path/name structure every path-bearing
//! command embeds.
//!
//! Ported field-for-field from `dos_namebuf` in `x68kremote.h`: a drive
//! letter, a tab-separated (`0x09`) directory path, and an 8.3 filename
//! split across `name1`/`ext`/`name2` (the latter holding anything past
//! the classic 8.3 limit for long-filename-aware callers).

use binrw::prelude::*;
use remote_drive_dtyp::binrw_util::prelude::FixedBytes;

pub const NAMEBUF_SIZE: usize = 88;

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameBuf {
    pub flag: u8,
    pub drive: u8,
    pub path: FixedBytes<65>,
    pub name1: FixedBytes<8>,
    pub ext: FixedBytes<3>,
    pub name2: FixedBytes<10>,
}

impl NameBuf {
    /// Directory path segments, split on the `0x09` separator byte,
    /// stopping at the first NUL or unused tail. Runs of consecutive
    /// separators (`conv_namebuf`'s "skip runs of 0x09") collapse to
    /// nothing, matching the original's path-building loop.
    pub fn path_segments(&self) -> Vec<&[u8]> {
        let raw = self.path.as_slice();
        let mut segments = Vec::new();
        let mut i = 0;
        while i < raw.len() {
            while i < raw.len() && raw[i] == 0x09 {
                i += 1;
            }
            if i >= raw.len() || raw[i] == 0x00 {
                break;
            }
            let start = i;
            while i < raw.len() && raw[i] != 0x00 && raw[i] != 0x09 {
                i += 1;
            }
            segments.push(&raw[start..i]);
        }
        segments
    }

    /// True when the path portion is empty (the root directory marker,
    /// `"\t"` as a C string - i.e. a single leading separator and
    /// nothing else).
    pub fn is_root_path(&self) -> bool {
        self.path_segments().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    fn sample() -> NameBuf {
        let mut path = [0u8; 65];
        path[0] = 0x09;
        path[1..5].copy_from_slice(b"FOO\t");
        path[5..9].copy_from_slice(b"BAR\0");
        NameBuf {
            flag: 0,
            drive: 0,
            path: FixedBytes(path),
            name1: FixedBytes::from(b"HELLO   ".as_slice()),
            ext: FixedBytes::from(b"TXT".as_slice()),
            name2: FixedBytes::default(),
        }
    }

    #[test]
    fn round_trips_through_binrw() {
        let nb = sample();
        let mut buf = Vec::new();
        nb.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), NAMEBUF_SIZE);
        let back = NameBuf::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, nb);
    }

    #[test]
    fn splits_path_segments() {
        let nb = sample();
        assert_eq!(nb.path_segments(), vec![b"FOO".as_slice(), b"BAR".as_slice()]);
    }

    #[test]
    fn empty_path_is_root() {
        let nb = NameBuf {
            flag: 0,
            drive: 0,
            path: FixedBytes::default(),
            name1: FixedBytes::default(),
            ext: FixedBytes::default(),
            name2: FixedBytes::default(),
        };
        assert!(nb.is_root_path());
    }
}
