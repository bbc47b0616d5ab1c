//! Human68k file attribute bitmask.
//!
//! Same single byte as Human68k's own `_ATTR_*` constants: read-only,
//! hidden, system, volume-label, directory, archive. The service only ever
//! produces `readonly`, `directory`, `archive` and the synthetic `volume`
//! bit (used once, for the root directory's volume-label entry); the
//! others are preserved for round-tripping a byte coming from the driver.

use binrw::{BinRead, BinWrite, Endian};
use modular_bitfield::prelude::*;
use std::io::{Read, Seek, Write};

#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub readonly: bool,
    pub hidden: bool,
    pub system: bool,
    pub volume: bool,
    pub directory: bool,
    pub archive: bool,
    #[skip]
    __: B2,
}

impl FileAttr {
    /// The "report only, don't change" sentinel used by the `chmod` wire
    /// command (`op_chmod`'s `cmd->attr != 0xff` check).
    pub const QUERY_ONLY: u8 = 0xff;
}

impl BinRead for FileAttr {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let byte = u8::read_options(reader, Endian::Big, ())?;
        Ok(FileAttr::from_bytes([byte]))
    }
}

impl BinWrite for FileAttr {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        self.into_bytes()[0].write_options(writer, Endian::Big, ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_directory_archive() {
        let attr = FileAttr::new().with_directory(true).with_archive(true);
        let mut buf = Vec::new();
        attr.write_options(&mut Cursor::new(&mut buf), Endian::Big, ())
            .unwrap();
        assert_eq!(buf, vec![0x30]);
        let back = FileAttr::read_options(&mut Cursor::new(&buf), Endian::Big, ()).unwrap();
        assert_eq!(back, attr);
    }
}
