//! Whole-file data transfer over cluster chains

use super::{constants::*, fat_entry::FatEntry, Fat16};
use crate::filesys::FsError;
use core::cmp::min;

impl Fat16<'_> {
    /// Allocates a fresh chain holding `data` and returns its first cluster,
    /// or 0 for empty data.
    ///
    /// If allocation or any device write fails part way, the clusters taken
    /// so far are released again before the error is returned.
    pub(super) fn write_chain(&mut self, data: &[u8]) -> Result<u16, FsError> {
        let mut start_cluster = 0;
        match self.fill_chain(data, &mut start_cluster) {
            Ok(()) => Ok(start_cluster),
            Err(err) => {
                if start_cluster != 0 {
                    log::warn!("write failed ({}), releasing new chain", err);
                    if let Err(cleanup) = self.free_chain(start_cluster) {
                        log::error!("new chain at {} not fully released: {}", start_cluster, cleanup);
                    }
                }
                Err(err)
            }
        }
    }

    /// Allocates, links and fills clusters; `start_cluster` is set as soon as
    /// the first one is taken
    fn fill_chain(&mut self, data: &[u8], start_cluster: &mut u16) -> Result<(), FsError> {
        let cluster_size = self.geometry.cluster_size();
        let mut previous: Option<u16> = None;

        for chunk in data.chunks(cluster_size) {
            let cluster = self.allocate_cluster()?;
            match previous {
                Some(previous) => {
                    if let Err(err) = self.write_fat_entry(previous, FatEntry::link(cluster)) {
                        // Not on the chain yet, so the caller's release misses it
                        self.release_cluster(cluster);
                        return Err(err);
                    }
                }
                None => *start_cluster = cluster,
            }

            self.write_cluster(cluster, chunk)?;
            previous = Some(cluster);
        }

        Ok(())
    }

    /// Writes up to one cluster of data, zero-padding the tail
    fn write_cluster(&mut self, cluster: u16, chunk: &[u8]) -> Result<(), FsError> {
        let first_sector = self.cluster_to_sector(cluster);

        for sector_index in 0..self.geometry.sectors_per_cluster as u64 {
            let start = min(sector_index as usize * SECTOR_SIZE, chunk.len());
            let end = min(start + SECTOR_SIZE, chunk.len());

            let mut sector_data = [0u8; SECTOR_SIZE];
            sector_data[..end - start].copy_from_slice(&chunk[start..end]);
            self.device.write_sector(first_sector + sector_index, &sector_data)?;
        }

        Ok(())
    }

    /// Copies up to `min(size, buf.len())` bytes of the chain at `start` into
    /// `buf`, stopping early if the chain ends. Returns the bytes copied.
    pub(super) fn read_chain(&mut self, start: u16, size: usize, buf: &mut [u8]) -> usize {
        let bytes_to_read = min(size, buf.len());
        let mut bytes_read = 0;

        if !self.geometry.is_data_cluster(start) {
            log::warn!("file of {} bytes has no valid first cluster ({})", size, start);
            return 0;
        }

        let mut current_cluster = start;
        while bytes_read < bytes_to_read {
            let first_sector = self.cluster_to_sector(current_cluster);

            for sector_index in 0..self.geometry.sectors_per_cluster as u64 {
                let chunk_size = min(SECTOR_SIZE, bytes_to_read - bytes_read);
                let sector_data = self.device.read_sector(first_sector + sector_index);
                buf[bytes_read..bytes_read + chunk_size].copy_from_slice(&sector_data[..chunk_size]);
                bytes_read += chunk_size;

                if bytes_read == bytes_to_read {
                    return bytes_read;
                }
            }

            match self.next_cluster(current_cluster) {
                Some(next) => current_cluster = next,
                None => {
                    log::warn!(
                        "chain at cluster {} ended after {} of {} bytes",
                        start,
                        bytes_read,
                        bytes_to_read
                    );
                    break;
                }
            }
        }

        bytes_read
    }
}
