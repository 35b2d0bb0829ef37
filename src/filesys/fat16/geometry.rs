//! Fixed FAT16 volume layout
//!
//! ```text
//! | boot | FAT 0 | FAT 1 | root directory | data clusters 2.. |
//! ```
//!
//! Every layer asks the geometry for offsets instead of keeping its own copy.

use super::constants::*;

/// Layout parameters of a volume. Sector size is always [`SECTOR_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub sectors_per_fat: u16,
    pub root_dir_entries: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Geometry {
    pub const DEFAULT: Geometry = Geometry {
        total_sectors: TOTAL_SECTORS,
        sectors_per_cluster: SECTORS_PER_CLUSTER,
        reserved_sectors: RESERVED_SECTORS,
        fat_count: FAT_COUNT,
        sectors_per_fat: SECTORS_PER_FAT,
        root_dir_entries: ROOT_DIR_ENTRIES as u16,
    };

    /// Sectors occupied by the root directory
    pub const fn root_dir_sectors(&self) -> u64 {
        (self.root_dir_entries as u64 * DIR_ENTRY_SIZE as u64).div_ceil(SECTOR_SIZE as u64)
    }

    /// First sector of FAT copy 0
    pub const fn first_fat_sector(&self) -> u64 {
        self.reserved_sectors as u64
    }

    /// First sector of the given FAT copy
    pub const fn fat_copy_start(&self, copy: u8) -> u64 {
        self.first_fat_sector() + copy as u64 * self.sectors_per_fat as u64
    }

    pub const fn first_root_dir_sector(&self) -> u64 {
        self.fat_copy_start(self.fat_count)
    }

    pub const fn first_data_sector(&self) -> u64 {
        self.first_root_dir_sector() + self.root_dir_sectors()
    }

    /// Bytes in one cluster
    pub const fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    /// Data clusters that fit in the data area
    pub const fn data_clusters(&self) -> u64 {
        let data_start = self.first_data_sector();
        if self.total_sectors as u64 <= data_start || self.sectors_per_cluster == 0 {
            return 0;
        }
        (self.total_sectors as u64 - data_start) / self.sectors_per_cluster as u64
    }

    /// One past the highest addressable cluster number.
    ///
    /// Bounded by the data area, by the entries one FAT copy can hold, and by
    /// the values that still read as a cluster link.
    pub const fn cluster_limit(&self) -> u32 {
        let by_data = FIRST_DATA_CLUSTER as u64 + self.data_clusters();
        let by_fat = self.sectors_per_fat as u64 * SECTOR_SIZE as u64 / FAT_ENTRY_SIZE as u64;
        let by_value = 0xFFF7u64;

        let mut limit = by_data;
        if by_fat < limit {
            limit = by_fat;
        }
        if by_value < limit {
            limit = by_value;
        }
        limit as u32
    }

    /// True if `cluster` may belong to a file chain
    pub const fn is_data_cluster(&self, cluster: u16) -> bool {
        cluster >= FIRST_DATA_CLUSTER && (cluster as u32) < self.cluster_limit()
    }

    /// First sector of a data cluster
    pub const fn cluster_to_sector(&self, cluster: u16) -> u64 {
        self.first_data_sector()
            + (cluster as u64 - FIRST_DATA_CLUSTER as u64) * self.sectors_per_cluster as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let geometry = Geometry::DEFAULT;
        assert_eq!(geometry.root_dir_sectors(), 32);
        assert_eq!(geometry.first_fat_sector(), 1);
        assert_eq!(geometry.fat_copy_start(1), 5);
        assert_eq!(geometry.first_root_dir_sector(), 9);
        assert_eq!(geometry.first_data_sector(), 41);
        assert_eq!(geometry.data_clusters(), 471);
        assert_eq!(geometry.cluster_limit(), 473);
    }

    #[test]
    fn test_cluster_to_sector() {
        let geometry = Geometry::DEFAULT;
        assert_eq!(geometry.cluster_to_sector(2), 41);
        assert_eq!(geometry.cluster_to_sector(3), 42);

        let wide = Geometry {
            sectors_per_cluster: 4,
            ..Geometry::DEFAULT
        };
        assert_eq!(wide.cluster_to_sector(3), 45);
        assert_eq!(wide.cluster_size(), 2048);
    }

    #[test]
    fn test_cluster_limit_bounded_by_fat() {
        let big = Geometry {
            total_sectors: 4096,
            ..Geometry::DEFAULT
        };
        // 4 FAT sectors hold 1024 entries
        assert_eq!(big.cluster_limit(), 1024);
        assert!(big.is_data_cluster(1023));
        assert!(!big.is_data_cluster(1024));
        assert!(!big.is_data_cluster(1));
    }

    #[test]
    fn test_odd_root_entry_count_rounds_up() {
        let geometry = Geometry {
            root_dir_entries: 17,
            ..Geometry::DEFAULT
        };
        assert_eq!(geometry.root_dir_sectors(), 2);
    }
}
