//! Turning a wire-format [`NameBuf`] into a host path, and matching
//! directory candidates against an 8.3 search pattern.
//!
//! Ported from `conv_namebuf` and the pattern-building/matching half of
//! `op_files` in `remoteserv.c`. Two host-filesystem quirks the original
//! has to work around on its own don't apply here and are simply absent:
//! POSIX `readdir` yields `.`/`..` entries that the original skips by
//! hand, while `std::fs::read_dir` never produces them at all.

use std::path::{Path, PathBuf};

use remote_drive_dtyp::sjis::{sjis_to_utf8, utf8_to_sjis, CharsetError};
use remote_drive_fscc::HumanError;
use remote_drive_msg::NameBuf;

use crate::config::ServiceConfig;

/// Resolves a [`NameBuf`] to a host path under the unit's configured
/// root, or the `NoDir` the original substitutes for any translation
/// failure (bad unit index or an unmappable Shift-JIS byte).
///
/// `full`: whether to also append the 8.3 name/extension (`false` for
/// `chdir`, which only cares about the directory path itself).
pub fn host_path(config: &ServiceConfig, namebuf: &NameBuf, full: bool) -> Result<PathBuf, HumanError> {
    let root = config.root(namebuf.drive).map_err(|_| HumanError::NoDir)?;
    let raw = assemble_raw_path(namebuf, full);
    let decoded = sjis_to_utf8(&raw).map_err(|_| HumanError::NoDir)?;
    Ok(join_root(root, &decoded))
}

fn join_root(root: &Path, decoded: &str) -> PathBuf {
    let root_str = root.to_string_lossy();
    let mut out = String::with_capacity(root_str.len() + decoded.len());
    out.push_str(root_str.trim_end_matches('/'));
    out.push_str(decoded);
    PathBuf::from(out)
}

/// Builds the raw Shift-JIS byte string `conv_namebuf` assembles before
/// handing it to `iconv`: a `/`-joined directory path, and - when `full`
/// - the 8.3 name, stripped of its padding, joined to a stripped
/// extension by a `.` that's removed again if the extension is empty.
fn assemble_raw_path(namebuf: &NameBuf, full: bool) -> Vec<u8> {
    let mut raw = Vec::new();
    for segment in namebuf.path_segments() {
        raw.push(b'/');
        raw.extend_from_slice(segment);
    }
    if full {
        raw.push(b'/');
        let mut name = [0u8; 18];
        name[..8].copy_from_slice(namebuf.name1.as_slice());
        name[8..].copy_from_slice(namebuf.name2.as_slice());
        let mut len = 18;
        while len > 0 && name[len - 1] == 0 {
            len -= 1;
        }
        while len > 0 && name[len - 1] == b' ' {
            len -= 1;
        }
        raw.extend_from_slice(&name[..len]);
        raw.push(b'.');
        raw.extend_from_slice(namebuf.ext.trim_trailing(b' '));
        while raw.last() == Some(&b'.') {
            raw.pop();
        }
    }
    raw
}

fn is_sjis_lead(b: u8) -> bool {
    (0x81..=0x9f).contains(&b) || (0xe0..=0xef).contains(&b)
}

/// The 21-byte normalized search pattern `op_files` builds out of a
/// request's `name1`/`ext`/`name2` fields: `name2` is wildcarded whole
/// when `name1`'s last byte is `?` and `name2`'s first byte is NUL (the
/// client's way of encoding a bare `*` for the primary name), padding
/// bytes are cleared to NUL, and everything is lowercased except the
/// trailing byte of any two-byte Shift-JIS character (so a kana second
/// byte in the 0x40-0x7e/0xa1-0xfc range is never mistaken for an ASCII
/// letter).
pub fn build_pattern(namebuf: &NameBuf) -> [u8; 21] {
    let mut w = [0u8; 21];
    w[0..8].copy_from_slice(namebuf.name1.as_slice());
    let name1 = namebuf.name1.as_slice();
    let name2 = namebuf.name2.as_slice();
    if name1[7] == b'?' && name2[0] == 0 {
        w[8..18].fill(b'?');
    } else {
        w[8..18].copy_from_slice(name2);
    }
    let mut i = 18i32;
    while i > 0 && (w[(i - 1) as usize] == 0 || w[(i - 1) as usize] == b' ') {
        i -= 1;
        w[i as usize] = 0;
    }
    w[18..21].copy_from_slice(namebuf.ext.as_slice());
    let mut j = 21i32;
    while j > 18 && w[(j - 1) as usize] == b' ' {
        j -= 1;
        w[j as usize] = 0;
    }

    let mut i = 0usize;
    while i < 21 {
        let c = w[i];
        if is_sjis_lead(c) {
            i += 2;
        } else {
            w[i] = c.to_ascii_lowercase();
            i += 1;
        }
    }
    w
}

/// True when `pattern` is the literal `*.*` wildcard - the gate `op_files`
/// checks, alongside the root directory and the `0x08` attribute bit,
/// before synthesizing the volume-label entry.
pub fn is_wildcard_all(pattern: &[u8; 21]) -> bool {
    pattern[0] == b'?' && pattern[18] == b'?'
}

/// Rejects candidate names `op_files` would never even attempt to match:
/// control characters, a leading `-`, or any of the Human68k-reserved
/// path punctuation. Lead bytes of a two-byte Shift-JIS character are
/// skipped over rather than inspected.
pub fn is_valid_candidate_name(name_sjis: &[u8]) -> bool {
    let mut i = 0;
    while i < name_sjis.len() {
        let c = name_sjis[i];
        if is_sjis_lead(c) {
            i += 2;
            continue;
        }
        if c <= 0x1f {
            return false;
        }
        if i == 0 && c == b'-' {
            return false;
        }
        if matches!(c, b'/' | b'\\' | b',' | b';' | b'<' | b'=' | b'>' | b'[' | b']' | b'|') {
            return false;
        }
        i += 1;
    }
    true
}

/// Splits a candidate's Shift-JIS name into the same 21-byte normalized
/// shape [`build_pattern`] produces, so the two can be compared
/// byte-for-byte. The primary name is capped at 18 bytes (the extension
/// search only looks at the last 1-3 bytes after the final `.`); names
/// whose primary part doesn't fit return `None` and are skipped, as the
/// original's `if (18 < m) continue;` does.
pub fn candidate_key(name_sjis: &[u8]) -> Option<[u8; 21]> {
    let k = name_sjis.len();
    if k == 0 {
        return None;
    }
    let m = if name_sjis[k - 1] == b'.' {
        k
    } else if k >= 3 && name_sjis[k - 2] == b'.' {
        k - 2
    } else if k >= 4 && name_sjis[k - 3] == b'.' {
        k - 3
    } else if k >= 5 && name_sjis[k - 4] == b'.' {
        k - 4
    } else {
        k
    };
    if m > 18 {
        return None;
    }
    let mut w = [0u8; 21];
    w[..m].copy_from_slice(&name_sjis[..m]);
    if name_sjis.get(m) == Some(&b'.') {
        let ext = &name_sjis[m + 1..];
        let take = ext.len().min(3);
        w[18..18 + take].copy_from_slice(&ext[..take]);
    }
    Some(w)
}

/// Compares a candidate's normalized name against a pattern. `?` matches
/// anything; otherwise the candidate byte is upper-to-lower folded
/// before comparing, unless it's the trailing byte of a two-byte
/// Shift-JIS character (tracked the same way `build_pattern` tracks lead
/// bytes, but walking the *candidate* bytes this time, since those are
/// the ones that might still carry unfolded case).
pub fn matches_pattern(pattern: &[u8; 21], candidate: &[u8; 21]) -> bool {
    let mut continuation = false;
    for i in 0..21 {
        let c = candidate[i];
        let d = pattern[i];
        if d != b'?' {
            let folded = if c.is_ascii_uppercase() && !continuation {
                c.to_ascii_lowercase()
            } else {
                c
            };
            if folded != d {
                return false;
            }
        }
        continuation = !continuation && is_sjis_lead(c);
    }
    true
}

/// Converts a host path's UTF-8 display form to Shift-JIS for the
/// synthetic volume-label entry, falling back to an empty name on an
/// unmappable byte rather than failing the whole `files` call.
pub fn volume_label_name(path: &Path) -> Vec<u8> {
    utf8_to_sjis(&path.to_string_lossy()).unwrap_or_default()
}

pub fn host_name_to_sjis(name: &str) -> Result<Vec<u8>, CharsetError> {
    utf8_to_sjis(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_drive_dtyp::binrw_util::prelude::FixedBytes;

    fn namebuf(drive: u8, path: &[u8], name1: &[u8], ext: &[u8], name2: &[u8]) -> NameBuf {
        NameBuf {
            flag: 0,
            drive,
            path: FixedBytes::from(path),
            name1: FixedBytes::from(name1),
            ext: FixedBytes::from(ext),
            name2: FixedBytes::from(name2),
        }
    }

    #[test]
    fn host_path_joins_root_and_directory_segments() {
        let config = ServiceConfig::new(vec![PathBuf::from("/srv/x68000")]);
        let nb = namebuf(0, b"\tFOO\tBAR", b"", b"", b"");
        let path = host_path(&config, &nb, false).unwrap();
        assert_eq!(path, PathBuf::from("/srv/x68000/FOO/BAR"));
    }

    #[test]
    fn host_path_appends_name_and_extension_when_full() {
        let config = ServiceConfig::new(vec![PathBuf::from("/srv/x68000")]);
        let nb = namebuf(0, b"", b"HELLO   ", b"TXT", b"");
        let path = host_path(&config, &nb, true).unwrap();
        assert_eq!(path, PathBuf::from("/srv/x68000/HELLO.TXT"));
    }

    #[test]
    fn host_path_drops_trailing_dot_when_extension_is_empty() {
        let config = ServiceConfig::new(vec![PathBuf::from("/srv/x68000")]);
        let nb = namebuf(0, b"", b"HELLO   ", b"   ", b"");
        let path = host_path(&config, &nb, true).unwrap();
        assert_eq!(path, PathBuf::from("/srv/x68000/HELLO"));
    }

    #[test]
    fn host_path_rejects_unconfigured_unit() {
        let config = ServiceConfig::new(vec![PathBuf::from("/srv/x68000")]);
        let nb = namebuf(3, b"", b"", b"", b"");
        assert_eq!(host_path(&config, &nb, true), Err(HumanError::NoDir));
    }

    #[test]
    fn build_pattern_wildcards_name2_for_bare_star() {
        let nb = namebuf(0, b"", b"???????\x3f", b"???", b"");
        let w = build_pattern(&nb);
        assert!(is_wildcard_all(&w));
        assert_eq!(&w[8..18], b"??????????");
    }

    #[test]
    fn candidate_key_splits_extension_at_last_dot() {
        let key = candidate_key(b"hello.txt").unwrap();
        assert_eq!(&key[..5], b"hello");
        assert_eq!(&key[18..21], b"txt");
    }

    #[test]
    fn candidate_key_rejects_overlong_primary_name() {
        assert!(candidate_key(b"a_name_much_too_long_for_8_3.txt").is_none());
    }

    #[test]
    fn matches_pattern_is_case_insensitive_on_ascii() {
        let nb = namebuf(0, b"", b"HELLO   ", b"TXT", b"");
        let pattern = build_pattern(&nb);
        let candidate = candidate_key(b"Hello.TXT").unwrap();
        assert!(matches_pattern(&pattern, &candidate));
    }

    #[test]
    fn matches_pattern_wildcard_matches_anything() {
        let nb = namebuf(0, b"", b"????????", b"???", b"");
        let pattern = build_pattern(&nb);
        let candidate = candidate_key(b"readme.txt").unwrap();
        assert!(matches_pattern(&pattern, &candidate));
    }

    #[test]
    fn is_valid_candidate_name_rejects_leading_dash() {
        assert!(!is_valid_candidate_name(b"-rf"));
    }

    #[test]
    fn is_valid_candidate_name_accepts_ordinary_name() {
        assert!(is_valid_candidate_name(b"readme.txt"));
    }
}
