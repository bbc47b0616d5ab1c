//! [`FixedBytes`] implementation for binrw: a fixed-width, NUL/space-padded
//! byte field, as used throughout [`crate::namebuf::NameBuf`].

use binrw::{BinRead, BinWrite, Endian};
use std::io::{Read, Seek, Write};

/// A byte buffer of a fixed width `N`, read and written verbatim.
///
/// Unlike a plain `[u8; N]`, this type keeps its declared width separate
/// from any notion of "string length" - trimming trailing padding is left
/// to the caller, since the padding byte differs by field (`0x00` for the
/// path, `0x20` for the 8.3 name/extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBytes<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedBytes<N> {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Trims trailing occurrences of `pad` and returns the remainder.
    pub fn trim_trailing(&self, pad: u8) -> &[u8] {
        let mut end = N;
        while end > 0 && self.0[end - 1] == pad {
            end -= 1;
        }
        &self.0[..end]
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        FixedBytes([0; N])
    }
}

impl<const N: usize> From<&[u8]> for FixedBytes<N> {
    fn from(src: &[u8]) -> Self {
        let mut buf = [0u8; N];
        let len = src.len().min(N);
        buf[..len].copy_from_slice(&src[..len]);
        FixedBytes(buf)
    }
}

impl<const N: usize> BinRead for FixedBytes<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(FixedBytes(buf))
    }
}

impl<const N: usize> BinWrite for FixedBytes<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_through_cursor() {
        let fb = FixedBytes::<8>::from(b"ABC".as_slice());
        let mut buf = Vec::new();
        fb.write_options(&mut Cursor::new(&mut buf), Endian::Big, ())
            .unwrap();
        assert_eq!(buf, b"ABC\0\0\0\0\0");
        let back =
            FixedBytes::<8>::read_options(&mut Cursor::new(&buf), Endian::Big, ()).unwrap();
        assert_eq!(back.0, fb.0);
    }

    #[test]
    fn trims_trailing_pad() {
        let fb = FixedBytes::<8>::from(b"AB".as_slice());
        assert_eq!(fb.trim_trailing(0), b"AB");
    }
}
