//! `dskfre` reply shape and its cluster-count scaling.
//!
//! Ported from `op_dskfre`: raw byte counts are clamped to `i32::MAX` then
//! divided by 32768 (128 sectors/cluster * 1024 bytes/sector) to produce a
//! 16-bit cluster count, rather than dividing by the actual
//! bytes-per-cluster - `clusect`/`sectsize` are reported as fixed
//! constants independent of the host filesystem's real block size.

use binrw::prelude::*;

const CLUSTER_BYTES: u64 = 128 * 1024;

/// The `dskfre` response's on-wire shape: a leading `res` field carrying
/// the clamped raw free-byte count (spec.md S4.8's "32-bit raw free
/// bytes... returned as the primary result field"), followed by the four
/// big-endian `u16` cluster/geometry fields. The call has no failure
/// mode of its own, so `res` is always this non-negative byte count,
/// never a [`crate::HumanError`] code.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskFree {
    pub res: i32,
    pub free_clusters: u16,
    pub total_clusters: u16,
    pub sectors_per_cluster: u16,
    pub bytes_per_sector: u16,
}

impl DiskFree {
    pub fn from_bytes(free_bytes: u64, total_bytes: u64) -> Self {
        let free = free_bytes.min(i32::MAX as u64);
        let total = total_bytes.min(i32::MAX as u64);
        DiskFree {
            res: free as i32,
            free_clusters: (free / CLUSTER_BYTES) as u16,
            total_clusters: (total / CLUSTER_BYTES) as u16,
            sectors_per_cluster: 128,
            bytes_per_sector: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_by_cluster_bytes() {
        let df = DiskFree::from_bytes(CLUSTER_BYTES * 10, CLUSTER_BYTES * 100);
        assert_eq!(df.res, (CLUSTER_BYTES * 10) as i32);
        assert_eq!(df.free_clusters, 10);
        assert_eq!(df.total_clusters, 100);
        assert_eq!(df.sectors_per_cluster, 128);
        assert_eq!(df.bytes_per_sector, 1024);
    }

    #[test]
    fn raw_free_bytes_are_clamped_to_i32_max() {
        let df = DiskFree::from_bytes(u64::MAX, u64::MAX);
        assert_eq!(df.res, i32::MAX);
    }
}
