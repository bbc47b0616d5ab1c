//! Driver-side write-back data cache (spec.md S3 "data cache", S4.3).
//!
//! Ported from `struct dcache`/`dcache_flash` in `driver/serremote.c`.
//! The original keeps exactly one global instance; this generalizes it to
//! a small pool (`DriverConfig::cache_lines`, default `1`) so more than
//! one concurrently open file can each hold a write-back line without
//! stepping on each other, while the default configuration reproduces the
//! original's single-line behavior exactly.

use log::trace;

use super::wire;
use remote_drive_transport::FrameChannel;

use crate::error::Result;

struct CacheLine {
    fcb: u32,
    offset: u32,
    dirty: bool,
    data: Vec<u8>,
}

impl CacheLine {
    fn empty(capacity: usize) -> Self {
        CacheLine {
            fcb: 0,
            offset: 0,
            dirty: false,
            data: Vec::with_capacity(capacity),
        }
    }

    fn is_free(&self) -> bool {
        self.fcb == 0
    }

    fn covers(&self, fcb: u32, pos: u32) -> bool {
        self.fcb == fcb && pos >= self.offset && pos < self.offset + self.data.len() as u32
    }

    /// The original's buggy `(*pp = dcache.offset + dcache.len)` write-path
    /// check is implemented here as the equality test it was clearly meant
    /// to be (spec.md S9): this line's data is contiguous with a write
    /// starting at `pos`.
    fn is_contiguous_with(&self, fcb: u32, pos: u32) -> bool {
        self.fcb == fcb && pos == self.offset + self.data.len() as u32
    }
}

pub struct CachePool {
    lines: Vec<CacheLine>,
    line_size: usize,
}

impl CachePool {
    pub fn new(lines: usize, line_size: usize) -> Self {
        let lines = (0..lines.max(1)).map(|_| CacheLine::empty(line_size)).collect();
        CachePool { lines, line_size }
    }

    fn index_for(&self, fcb: u32) -> Option<usize> {
        self.lines.iter().position(|l| l.fcb == fcb)
    }

    fn index_covering(&self, fcb: u32, pos: u32) -> Option<usize> {
        self.lines.iter().position(|l| l.covers(fcb, pos))
    }

    fn free_index(&self) -> Option<usize> {
        self.lines.iter().position(|l| l.is_free())
    }

    /// Flushes a dirty line belonging to `fcb`, optionally freeing its
    /// slot afterwards (`dcache_flash`'s `clean` flag).
    pub fn flush<T: std::io::Read + std::io::Write>(
        &mut self,
        fcb: u32,
        clean: bool,
        chan: &mut FrameChannel<T>,
    ) -> Result<()> {
        if let Some(i) = self.index_for(fcb) {
            let line = &mut self.lines[i];
            if line.dirty {
                wire::send_write(chan, fcb, line.offset, &line.data)?;
                line.dirty = false;
            }
            if clean {
                self.lines[i] = CacheLine::empty(self.line_size);
            }
        }
        Ok(())
    }

    /// Evicts (flushing if dirty) whatever occupies a slot for `fcb`,
    /// falling back to the first slot in the pool when `fcb` has none -
    /// the eviction policy the original never needed with a pool of one.
    fn reclaim_slot<T: std::io::Read + std::io::Write>(
        &mut self,
        fcb: u32,
        chan: &mut FrameChannel<T>,
    ) -> Result<usize> {
        if let Some(i) = self.index_for(fcb) {
            self.flush(fcb, true, chan)?;
            return Ok(i);
        }
        if let Some(i) = self.free_index() {
            return Ok(i);
        }
        let victim = self.lines[0].fcb;
        self.flush(victim, true, chan)?;
        Ok(0)
    }

    /// Read-through cache fill + copy-out, mirroring the `case 0x4c` cache
    /// loop: serve what's already cached, refill the line when the
    /// remaining request is smaller than a line, and fall through to a
    /// direct server read for anything left over (or anything at all when
    /// the pool has no line available for this file).
    pub fn read<T: std::io::Read + std::io::Write>(
        &mut self,
        fcb: u32,
        pos: &mut u32,
        mut buf: &mut [u8],
        chan: &mut FrameChannel<T>,
    ) -> Result<usize> {
        let mut total = 0usize;

        loop {
            if let Some(i) = self.index_covering(fcb, *pos) {
                let line = &self.lines[i];
                let avail = (line.offset + line.data.len() as u32 - *pos) as usize;
                let n = avail.min(buf.len());
                let start = (*pos - line.offset) as usize;
                buf[..n].copy_from_slice(&line.data[start..start + n]);
                buf = &mut buf[n..];
                *pos += n as u32;
                total += n;
            }
            if buf.is_empty() {
                break;
            }
            if buf.len() >= self.line_size {
                break;
            }
            let slot = self.reclaim_slot(fcb, chan)?;
            let filled = wire::send_read(chan, fcb, *pos, self.line_size as u16)?;
            trace!("cache fill fcb={fcb:#x} pos={} -> {} bytes", *pos, filled.len());
            if filled.is_empty() {
                self.lines[slot] = CacheLine::empty(self.line_size);
                break;
            }
            self.lines[slot] = CacheLine {
                fcb,
                offset: *pos,
                dirty: false,
                data: filled,
            };
        }

        if !buf.is_empty() {
            let n = wire::send_read_into(chan, fcb, *pos, buf)?;
            *pos += n as u32;
            total += n;
        }

        Ok(total)
    }

    /// Write-back path, mirroring `case 0x4d`: a write smaller than a
    /// cache line either extends this file's line in place (when
    /// contiguous) or is buffered into a fresh line; anything else is
    /// flushed through and written directly.
    pub fn write<T: std::io::Read + std::io::Write>(
        &mut self,
        fcb: u32,
        pos: &mut u32,
        size: &mut u32,
        data: &[u8],
        chan: &mut FrameChannel<T>,
    ) -> Result<usize> {
        let len = data.len();

        if len > 0 && len < self.line_size {
            if let Some(i) = self.index_for(fcb) {
                let fits = self.lines[i].is_contiguous_with(fcb, *pos)
                    && self.lines[i].data.len() + len <= self.line_size;
                if fits {
                    self.lines[i].data.extend_from_slice(data);
                    self.lines[i].dirty = true;
                    *pos += len as u32;
                    if *pos > *size {
                        *size = *pos;
                    }
                    return Ok(len);
                }
                self.flush(fcb, true, chan)?;
            }
            if let Some(i) = self.free_index() {
                self.lines[i] = CacheLine {
                    fcb,
                    offset: *pos,
                    dirty: true,
                    data: data.to_vec(),
                };
                *pos += len as u32;
                if *pos > *size {
                    *size = *pos;
                }
                return Ok(len);
            }
        }

        self.flush(fcb, false, chan)?;
        let written = wire::send_write(chan, fcb, *pos, data)?;
        if written == 0 && len == 0 {
            *size = *pos;
        } else {
            *pos += written as u32;
            if *pos > *size {
                *size = *pos;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_has_requested_line_count() {
        let pool = CachePool::new(3, 1024);
        assert_eq!(pool.lines.len(), 3);
    }

    #[test]
    fn fresh_line_covers_nothing() {
        let line = CacheLine::empty(16);
        assert!(!line.covers(1, 0));
        assert!(line.is_free());
    }

    #[test]
    fn contiguity_check_requires_exact_offset_match() {
        let mut line = CacheLine::empty(16);
        line.fcb = 7;
        line.data = vec![1, 2, 3];
        line.offset = 100;
        assert!(line.is_contiguous_with(7, 103));
        assert!(!line.is_contiguous_with(7, 104));
        assert!(!line.is_contiguous_with(7, 102));
    }
}
