//! Driver-side directory-enumeration batching (spec.md S3 "directory-
//! enumeration cache", S4.3 "files / nfiles (driver side)").
//!
//! The wire carries exactly one entry per `files`/`nfiles` round trip
//! (`remote_drive_msg::fileops`), so "asking the server for up to N
//! entries" is implemented here as issuing `N - 1` back-to-back `nfiles`
//! transactions right after a successful `files` call and holding the
//! results in a local queue; later `nfiles` calls drain that queue before
//! touching the wire again. With the default `dir_batch = 1` this never
//! fires and every `nfiles` round-trips, matching the original exactly.

use std::collections::VecDeque;
use std::io::{Read, Write};

use binrw::io::Cursor;
use binrw::prelude::*;
use remote_drive_fscc::{FileAttr, FileInfo, HumanError};
use remote_drive_msg::{Command, NfilesRequest, NfilesResponse};
use remote_drive_transport::{FrameChannel, MAX_PAYLOAD};

use crate::error::{DriverError, Result};

pub struct DirCache {
    batch: usize,
    slot: Option<(u32, VecDeque<FileInfo>)>,
}

impl DirCache {
    pub fn new(batch: usize) -> Self {
        DirCache {
            batch: batch.max(1),
            slot: None,
        }
    }

    /// Called after a successful `files` round trip to opportunistically
    /// prefetch the rest of this batch.
    pub fn prime<T: Read + Write>(&mut self, chan: &mut FrameChannel<T>, filbuf: u32) {
        if self.batch <= 1 {
            return;
        }
        let mut queue = VecDeque::new();
        for _ in 0..self.batch - 1 {
            match fetch_one(chan, filbuf) {
                Ok(Some(info)) => queue.push_back(info),
                _ => break,
            }
        }
        if !queue.is_empty() {
            self.slot = Some((filbuf, queue));
        }
    }

    /// Serves the next entry for `filbuf`: from the local queue if one is
    /// held for this enumeration, otherwise a fresh `nfiles` round trip.
    pub fn next<T: Read + Write>(&mut self, chan: &mut FrameChannel<T>, filbuf: u32) -> Result<Option<FileInfo>> {
        if let Some((slot_filbuf, queue)) = &mut self.slot
            && *slot_filbuf == filbuf
        {
            if let Some(info) = queue.pop_front() {
                if queue.is_empty() {
                    self.slot = None;
                }
                return Ok(Some(info));
            }
        }
        fetch_one(chan, filbuf)
    }

    /// Drops any held batch for `filbuf`, e.g. when the client abandons an
    /// enumeration early.
    pub fn forget(&mut self, filbuf: u32) {
        if matches!(&self.slot, Some((f, _)) if *f == filbuf) {
            self.slot = None;
        }
    }
}

fn fetch_one<T: Read + Write>(chan: &mut FrameChannel<T>, filbuf: u32) -> Result<Option<FileInfo>> {
    let req = NfilesRequest {
        command: Command::Nfiles,
        filbuf,
    };
    let mut out = Vec::with_capacity(NfilesRequest::ENCODED_SIZE);
    req.write(&mut Cursor::new(&mut out))?;
    chan.send(&out)?;

    let mut recv_buf = vec![0u8; MAX_PAYLOAD];
    let payload = chan.recv(&mut recv_buf)?;
    let resp = NfilesResponse::read(&mut Cursor::new(payload))?;
    if resp.res == 0 {
        Ok(Some(resp.info))
    } else if resp.res as i32 == HumanError::NoMore.code() {
        Ok(None)
    } else {
        Err(DriverError::Remote(
            HumanError::from_code(resp.res as i32).unwrap_or(HumanError::IllegalParameter),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_of_one_never_holds_a_slot() {
        let cache = DirCache::new(1);
        assert!(cache.slot.is_none());
    }

    #[test]
    fn forget_clears_only_the_matching_slot() {
        let mut cache = DirCache::new(4);
        cache.slot = Some((7, VecDeque::from([FileInfo::new(FileAttr::new(), 0, 0, 0, b"A")])));
        cache.forget(8);
        assert!(cache.slot.is_some());
        cache.forget(7);
        assert!(cache.slot.is_none());
    }
}
