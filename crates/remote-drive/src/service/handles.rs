//! The service's two handle tables: open files keyed by the client's
//! `fcb` pointer, and in-progress directory enumerations keyed by its
//! `filbuf` pointer.
//!
//! Ported from `fi_alloc`/`fi_free` and `dl_alloc`/`dl_free` in
//! `remoteserv.c`: both are a small `Vec` scanned linearly for a free
//! slot, reusing one already keyed to the same pointer before growing.
//! The original represents "free" with a zero key (no valid client
//! pointer is ever zero); a `Vec<Option<_>>` is the direct Rust
//! equivalent, since `FS::File` has no such sentinel value of its own.

use std::collections::VecDeque;

use remote_drive_fscc::FileInfo;

/// One open file, keyed by the client's FCB pointer: the `fdinfo_t`
/// tuple of owning FCB, host file handle, and the last-known position
/// that lets a read/write continuing sequentially skip a host seek.
struct FileSlot<F> {
    fcb: u32,
    file: F,
    pos: u32,
}

pub struct FileTable<F> {
    slots: Vec<Option<FileSlot<F>>>,
}

impl<F> FileTable<F> {
    pub fn new() -> Self {
        FileTable { slots: Vec::new() }
    }

    /// Stores `file` under `fcb` at position `0`, reusing a slot already
    /// keyed to the same `fcb` (the client re-opening without a matching
    /// `close`) or the first free slot, growing the table only if none
    /// is free - `fi_alloc`'s scan order exactly.
    pub fn insert(&mut self, fcb: u32, file: F) {
        let slot = FileSlot { fcb, file, pos: 0 };
        if let Some(s) = self.slots.iter_mut().find(|s| matches!(s, Some(s) if s.fcb == fcb)) {
            *s = Some(slot);
            return;
        }
        if let Some(s) = self.slots.iter_mut().find(|s| s.is_none()) {
            *s = Some(slot);
            return;
        }
        self.slots.push(Some(slot));
    }

    pub fn get_mut(&mut self, fcb: u32) -> Option<&mut F> {
        self.slot_mut(fcb).map(|s| &mut s.file)
    }

    /// The file handle together with its remembered position, for
    /// `read`/`write` to compare against the requested offset.
    fn slot_mut(&mut self, fcb: u32) -> Option<&mut FileSlot<F>> {
        self.slots.iter_mut().find_map(|s| s.as_mut().filter(|s| s.fcb == fcb))
    }

    pub fn position(&mut self, fcb: u32) -> Option<u32> {
        self.slot_mut(fcb).map(|s| s.pos)
    }

    pub fn set_position(&mut self, fcb: u32, pos: u32) {
        if let Some(s) = self.slot_mut(fcb) {
            s.pos = pos;
        }
    }

    /// Frees the slot and hands back the file (`fi_free`), or `None` if
    /// no file is registered under `fcb` (`op_close`'s `BADF` case).
    pub fn remove(&mut self, fcb: u32) -> Option<F> {
        let slot = self.slots.iter_mut().find(|s| matches!(s, Some(s) if s.fcb == fcb))?;
        slot.take().map(|s| s.file)
    }
}

impl<F> Default for FileTable<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// One in-progress directory enumeration, keyed by the client's FILBUF
/// pointer: the remaining batch of matches not yet handed back.
struct DirSlot {
    filbuf: u32,
    entries: VecDeque<FileInfo>,
}

pub struct DirTable {
    slots: Vec<Option<DirSlot>>,
}

impl DirTable {
    pub fn new() -> Self {
        DirTable { slots: Vec::new() }
    }

    /// Registers a freshly-enumerated batch under `filbuf` (`op_files`'s
    /// `dl_alloc` call), immediately serving and discarding the first
    /// entry - freeing the slot right away if that exhausts the batch,
    /// matching the original's `if (dl->bufcnt == dl->buflen) dl_free(...)`
    /// run unconditionally at the end of `op_files`.
    pub fn start(&mut self, filbuf: u32, entries: Vec<FileInfo>) -> Option<FileInfo> {
        self.discard(filbuf);
        let mut entries: VecDeque<FileInfo> = entries.into();
        let first = entries.pop_front();
        if entries.is_empty() {
            return first;
        }
        if let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(DirSlot { filbuf, entries });
            return first;
        }
        self.slots.push(Some(DirSlot { filbuf, entries }));
        first
    }

    /// Serves the next entry for an enumeration `op_files` already
    /// started (`op_nfiles`), freeing the slot once exhausted. `None`
    /// both when the batch is empty and when `filbuf` names no active
    /// enumeration - the caller reports `NoMore` either way.
    pub fn next(&mut self, filbuf: u32) -> Option<FileInfo> {
        let slot = self.slots.iter_mut().find(|s| matches!(s, Some(d) if d.filbuf == filbuf))?;
        let dir = slot.as_mut().unwrap();
        let entry = dir.entries.pop_front();
        if dir.entries.is_empty() {
            *slot = None;
        }
        entry
    }

    /// Drops an enumeration outright without serving from it further -
    /// used when a fresh `files` call reuses the same `filbuf`.
    pub fn discard(&mut self, filbuf: u32) {
        if let Some(slot) = self.slots.iter_mut().find(|s| matches!(s, Some(d) if d.filbuf == filbuf)) {
            *slot = None;
        }
    }
}

impl Default for DirTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_drive_fscc::FileAttr;

    fn info(name: &[u8]) -> FileInfo {
        FileInfo::new(FileAttr::new(), 0, 0, 0, name)
    }

    #[test]
    fn file_table_reuses_same_fcb_slot() {
        let mut table = FileTable::new();
        table.insert(1, "a");
        table.insert(1, "b");
        assert_eq!(table.get_mut(1).map(|v| *v), Some("b"));
        assert!(table.remove(2).is_none());
    }

    #[test]
    fn file_table_tracks_position_per_slot() {
        let mut table = FileTable::new();
        table.insert(1, "a");
        assert_eq!(table.position(1), Some(0));
        table.set_position(1, 42);
        assert_eq!(table.position(1), Some(42));
        assert_eq!(table.position(9), None);
    }

    #[test]
    fn file_table_reuses_freed_slot_before_growing() {
        let mut table = FileTable::new();
        table.insert(1, "a");
        table.insert(2, "b");
        table.remove(1);
        table.insert(3, "c");
        assert_eq!(table.slots.len(), 2);
    }

    #[test]
    fn dir_table_serves_first_entry_inline_and_frees_when_exhausted() {
        let mut dirs = DirTable::new();
        let first = dirs.start(7, vec![info(b"a"), info(b"b")]);
        assert_eq!(first.unwrap().name_sjis(), b"a");
        assert_eq!(dirs.next(7).unwrap().name_sjis(), b"b");
        assert!(dirs.next(7).is_none());
    }

    #[test]
    fn dir_table_frees_immediately_on_single_entry_batch() {
        let mut dirs = DirTable::new();
        let first = dirs.start(7, vec![info(b"only")]);
        assert_eq!(first.unwrap().name_sjis(), b"only");
        assert!(dirs.next(7).is_none());
    }

    #[test]
    fn dir_table_start_discards_a_stale_enumeration_under_the_same_key() {
        let mut dirs = DirTable::new();
        dirs.start(7, vec![info(b"a"), info(b"b")]);
        dirs.start(7, vec![info(b"c")]);
        assert!(dirs.next(7).is_none());
    }
}
