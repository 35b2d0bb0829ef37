//! FAT table access: entry reads and mirrored writes, allocation, chain release

use super::{constants::*, fat_entry::FatEntry, Fat16};
use crate::filesys::FsError;

impl Fat16<'_> {
    /// Sector and in-sector offset of byte `byte` of `cluster`'s entry in FAT copy `copy`
    fn fat_byte_location(&self, copy: u8, cluster: u16, byte: usize) -> (u64, usize) {
        let offset = cluster as u64 * FAT_ENTRY_SIZE as u64 + byte as u64;
        let sector = self.geometry.fat_copy_start(copy) + offset / SECTOR_SIZE as u64;
        (sector, (offset % SECTOR_SIZE as u64) as usize)
    }

    /// True if `cluster` has an entry inside one FAT copy
    fn has_fat_slot(&self, cluster: u16) -> bool {
        let fat_bytes = self.geometry.sectors_per_fat as u64 * SECTOR_SIZE as u64;
        (cluster as u64 + 1) * FAT_ENTRY_SIZE as u64 <= fat_bytes
    }

    /// Reads FAT entry for given cluster from the first FAT copy
    pub fn read_fat_entry(&mut self, cluster: u16) -> FatEntry {
        if !self.has_fat_slot(cluster) {
            log::warn!("FAT lookup for cluster {} outside the table", cluster);
            return FatEntry::END_OF_CHAIN;
        }

        let (sector, offset) = self.fat_byte_location(0, cluster, 0);
        let sector_data = self.device.read_sector(sector);
        let low = sector_data[offset];
        let high = if offset + 1 < SECTOR_SIZE {
            sector_data[offset + 1]
        } else {
            self.device.read_sector(sector + 1)[0]
        };

        FatEntry {
            cluster: u16::from_le_bytes([low, high]),
        }
    }

    /// Writes FAT entry for given cluster into every FAT copy
    pub fn write_fat_entry(&mut self, cluster: u16, entry: FatEntry) -> Result<(), FsError> {
        if !self.has_fat_slot(cluster) {
            return Err(FsError::OutOfRange);
        }

        let bytes = entry.cluster.to_le_bytes();
        for copy in 0..self.geometry.fat_count {
            let (sector, offset) = self.fat_byte_location(copy, cluster, 0);
            let mut sector_data = self.device.read_sector(sector);
            sector_data[offset] = bytes[0];

            if offset + 1 < SECTOR_SIZE {
                sector_data[offset + 1] = bytes[1];
                self.device.write_sector(sector, &sector_data)?;
            } else {
                // Entry straddles two sectors
                self.device.write_sector(sector, &sector_data)?;
                let (next_sector, _) = self.fat_byte_location(copy, cluster, 1);
                let mut next_data = self.device.read_sector(next_sector);
                next_data[0] = bytes[1];
                self.device.write_sector(next_sector, &next_data)?;
            }
        }

        Ok(())
    }

    /// First free data cluster, scanning upward from cluster 2
    pub fn find_free_cluster(&mut self) -> Option<u16> {
        let limit = self.geometry.cluster_limit();
        (FIRST_DATA_CLUSTER as u32..limit)
            .map(|cluster| cluster as u16)
            .find(|&cluster| self.read_fat_entry(cluster).is_free())
    }

    /// Finds and allocates a free cluster, marking it end of chain
    pub fn allocate_cluster(&mut self) -> Result<u16, FsError> {
        let cluster = self.find_free_cluster().ok_or(FsError::DiskFull)?;
        if let Err(err) = self.write_fat_entry(cluster, FatEntry::END_OF_CHAIN) {
            self.release_cluster(cluster);
            return Err(err);
        }
        log::trace!("allocated cluster {}", cluster);
        Ok(cluster)
    }

    /// Best-effort return of a single cluster after a failed write
    pub(super) fn release_cluster(&mut self, cluster: u16) {
        if let Err(err) = self.write_fat_entry(cluster, FatEntry::FREE) {
            log::error!("cluster {} could not be released: {}", cluster, err);
        }
    }

    /// Cluster following `cluster` in its chain, `None` at the end.
    ///
    /// A link to a reserved, free or out-of-range cluster also ends the chain.
    pub fn next_cluster(&mut self, cluster: u16) -> Option<u16> {
        let entry = self.read_fat_entry(cluster);
        if entry.is_end_of_chain() {
            return None;
        }
        if !self.geometry.is_data_cluster(entry.cluster) {
            log::warn!(
                "cluster {} links to invalid cluster {:#06x}, chain cut short",
                cluster,
                entry.cluster
            );
            return None;
        }
        Some(entry.cluster)
    }

    /// Marks every cluster of the chain starting at `start` free
    pub fn free_chain(&mut self, start: u16) -> Result<(), FsError> {
        let mut cluster = start;
        let mut freed = 0u32;

        // A chain can never be longer than the table
        while self.geometry.is_data_cluster(cluster) && freed < self.geometry.cluster_limit() {
            let next = self.next_cluster(cluster);
            self.write_fat_entry(cluster, FatEntry::FREE)?;
            freed += 1;

            match next {
                Some(next) => cluster = next,
                None => break,
            }
        }

        log::trace!("freed {} clusters starting at {}", freed, start);
        Ok(())
    }

    /// Number of data clusters currently free
    pub fn free_cluster_count(&mut self) -> usize {
        let limit = self.geometry.cluster_limit();
        (FIRST_DATA_CLUSTER as u32..limit)
            .filter(|&cluster| self.read_fat_entry(cluster as u16).is_free())
            .count()
    }

    /// Converts cluster number to absolute sector number
    pub fn cluster_to_sector(&self, cluster: u16) -> u64 {
        self.geometry.cluster_to_sector(cluster)
    }
}
