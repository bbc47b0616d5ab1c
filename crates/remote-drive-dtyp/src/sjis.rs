//! Shift-JIS (CP932) <-> UTF-8 conversion.
//!
//! Covers ASCII, half-width katakana, and the hiragana/katakana blocks,
//! which is enough for the filenames this protocol actually carries.
//! Anything outside that is rejected rather than passed through or
//! replaced with a placeholder, per the charset fallback decision in
//! SPEC_FULL.md.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CharsetError {
    #[error("byte 0x{0:02x} has no Shift-JIS mapping")]
    UnmappableByte(u8),
    #[error("character {0:?} has no Shift-JIS mapping")]
    UnmappableChar(char),
    #[error("truncated multi-byte Shift-JIS sequence at end of input")]
    TruncatedSequence,
}

const HIRAGANA_SJIS_START: u8 = 0x9f;
const HIRAGANA_SJIS_LEAD: u8 = 0x82;
const HIRAGANA_SJIS_END: u8 = 0xf1;
const HIRAGANA_UNICODE_START: u32 = 0x3041;

const KATAKANA_SJIS_START: u8 = 0x40;
const KATAKANA_SJIS_LEAD: u8 = 0x83;
const KATAKANA_SJIS_END: u8 = 0x96;
const KATAKANA_UNICODE_START: u32 = 0x30a1;

const HALFWIDTH_KATAKANA_START: u8 = 0xa1;
const HALFWIDTH_KATAKANA_END: u8 = 0xdf;
const HALFWIDTH_KATAKANA_UNICODE_START: u32 = 0xff61;

/// Decodes a Shift-JIS byte string into a UTF-8 `String`.
///
/// Returns `Err` on the first byte sequence that has no mapping, matching
/// `conv_namebuf`'s all-or-nothing `iconv` call in the original service.
pub fn sjis_to_utf8(bytes: &[u8]) -> Result<String, CharsetError> {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            out.push(b as char);
            i += 1;
            continue;
        }
        if (HALFWIDTH_KATAKANA_START..=HALFWIDTH_KATAKANA_END).contains(&b) {
            let cp = HALFWIDTH_KATAKANA_UNICODE_START + (b - HALFWIDTH_KATAKANA_START) as u32;
            out.push(char::from_u32(cp).ok_or(CharsetError::UnmappableByte(b))?);
            i += 1;
            continue;
        }
        if b == HIRAGANA_SJIS_LEAD || b == KATAKANA_SJIS_LEAD {
            let trail = *bytes.get(i + 1).ok_or(CharsetError::TruncatedSequence)?;
            let cp = if b == HIRAGANA_SJIS_LEAD
                && (HIRAGANA_SJIS_START..=HIRAGANA_SJIS_END).contains(&trail)
            {
                HIRAGANA_UNICODE_START + (trail - HIRAGANA_SJIS_START) as u32
            } else if b == KATAKANA_SJIS_LEAD
                && (KATAKANA_SJIS_START..=KATAKANA_SJIS_END).contains(&trail)
            {
                KATAKANA_UNICODE_START + (trail - KATAKANA_SJIS_START) as u32
            } else {
                return Err(CharsetError::UnmappableByte(b));
            };
            out.push(char::from_u32(cp).ok_or(CharsetError::UnmappableByte(b))?);
            i += 2;
            continue;
        }
        return Err(CharsetError::UnmappableByte(b));
    }
    Ok(out)
}

/// Encodes a UTF-8 string into Shift-JIS bytes.
pub fn utf8_to_sjis(s: &str) -> Result<Vec<u8>, CharsetError> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let cp = c as u32;
        if cp < 0x80 {
            out.push(cp as u8);
            continue;
        }
        if (HALFWIDTH_KATAKANA_UNICODE_START..=0xff9f).contains(&cp) {
            out.push(HALFWIDTH_KATAKANA_START + (cp - HALFWIDTH_KATAKANA_UNICODE_START) as u8);
            continue;
        }
        if (HIRAGANA_UNICODE_START..=(HIRAGANA_UNICODE_START + (HIRAGANA_SJIS_END - HIRAGANA_SJIS_START) as u32)).contains(&cp) {
            out.push(HIRAGANA_SJIS_LEAD);
            out.push(HIRAGANA_SJIS_START + (cp - HIRAGANA_UNICODE_START) as u8);
            continue;
        }
        if (KATAKANA_UNICODE_START..=(KATAKANA_UNICODE_START + (KATAKANA_SJIS_END - KATAKANA_SJIS_START) as u32)).contains(&cp) {
            out.push(KATAKANA_SJIS_LEAD);
            out.push(KATAKANA_SJIS_START + (cp - KATAKANA_UNICODE_START) as u8);
            continue;
        }
        return Err(CharsetError::UnmappableChar(c));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let s = "HELLO.TXT";
        let bytes = utf8_to_sjis(s).unwrap();
        assert_eq!(bytes, s.as_bytes());
        assert_eq!(sjis_to_utf8(&bytes).unwrap(), s);
    }

    #[test]
    fn halfwidth_katakana_round_trips() {
        let bytes = [0xb1, 0xb2, 0xb3];
        let s = sjis_to_utf8(&bytes).unwrap();
        assert_eq!(utf8_to_sjis(&s).unwrap(), bytes);
    }

    #[test]
    fn hiragana_round_trips() {
        // "あ" (U+3042) is 0x82 0xa0 in Shift-JIS.
        let bytes = [0x82, 0xa0];
        let s = sjis_to_utf8(&bytes).unwrap();
        assert_eq!(s, "\u{3042}");
        assert_eq!(utf8_to_sjis(&s).unwrap(), bytes);
    }

    #[test]
    fn unmappable_byte_is_rejected() {
        assert!(sjis_to_utf8(&[0xfd]).is_err());
    }

    #[test]
    fn truncated_lead_byte_is_rejected() {
        assert!(sjis_to_utf8(&[0x82]).is_err());
    }
}
