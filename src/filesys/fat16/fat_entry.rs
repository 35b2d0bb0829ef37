//! FAT16 file allocation table entry

use super::constants::{FAT_EOC, FAT_EOC_MIN, FAT_FREE};

/// Represents a 16-bit FAT entry pointing to the next cluster in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatEntry {
    /// Cluster number or special value (0=free, >=0xFFF8=end)
    pub cluster: u16,
}

impl FatEntry {
    pub const FREE: FatEntry = FatEntry { cluster: FAT_FREE };
    pub const END_OF_CHAIN: FatEntry = FatEntry { cluster: FAT_EOC };

    /// Entry linking to `cluster`
    pub const fn link(cluster: u16) -> Self {
        Self { cluster }
    }

    /// Returns true if this entry marks the end of a cluster chain
    pub fn is_end_of_chain(&self) -> bool {
        self.cluster >= FAT_EOC_MIN
    }

    /// Returns true if this cluster is unused/free
    pub fn is_free(&self) -> bool {
        self.cluster == FAT_FREE
    }
}
