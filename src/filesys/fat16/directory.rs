//! Root directory search and update

use super::{constants::*, dir_entry::DirEntry83, Fat16};
use crate::filesys::FsError;
use alloc::vec::Vec;

/// Outcome of looking a short name up in the root directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSlot {
    /// The name exists; `offset` is the entry's absolute byte offset on the volume
    Existing { offset: u64, entry: DirEntry83 },
    /// The name is absent; `offset` is the first reusable slot
    Vacant { offset: u64 },
    /// The name is absent and no slot is free
    Full,
}

impl Fat16<'_> {
    /// Scans the root directory for `short_name`.
    ///
    /// Stops at the first never-used entry. Deleted entries seen on the way
    /// are remembered so the earliest hole is reused.
    pub fn find_entry(&mut self, short_name: &[u8; 11]) -> DirSlot {
        let entries_per_sector = SECTOR_SIZE / DIR_ENTRY_SIZE;
        let start_sector = self.geometry.first_root_dir_sector();
        let total_entries = self.geometry.root_dir_entries as usize;
        let mut vacant = None;

        for sector_offset in 0..self.geometry.root_dir_sectors() {
            let sector = start_sector + sector_offset;
            let sector_buffer = self.device.read_sector(sector);

            for i in 0..entries_per_sector {
                if sector_offset as usize * entries_per_sector + i >= total_entries {
                    break;
                }

                let entry_offset = i * DIR_ENTRY_SIZE;
                let raw = &sector_buffer[entry_offset..entry_offset + DIR_ENTRY_SIZE];
                let absolute_position = sector * SECTOR_SIZE as u64 + entry_offset as u64;

                match raw[0] {
                    END_OF_DIR_MARKER => {
                        return DirSlot::Vacant {
                            offset: vacant.unwrap_or(absolute_position),
                        };
                    }
                    DELETED_ENTRY_MARKER => {
                        vacant.get_or_insert(absolute_position);
                    }
                    _ => {
                        let entry = DirEntry83::from_bytes(raw);
                        if !entry.is_volume_label() && entry.short_name() == *short_name {
                            return DirSlot::Existing {
                                offset: absolute_position,
                                entry,
                            };
                        }
                    }
                }
            }
        }

        match vacant {
            Some(offset) => DirSlot::Vacant { offset },
            None => DirSlot::Full,
        }
    }

    /// Fills all 32 bytes of the entry at `offset` and writes its sector back
    pub fn write_entry(
        &mut self,
        offset: u64,
        short_name: &[u8; 11],
        start_cluster: u16,
        file_size: u32,
    ) -> Result<(), FsError> {
        let entry = DirEntry83::new_file(short_name, start_cluster, file_size);
        self.update_entry_bytes(offset, |raw| raw.copy_from_slice(&entry.to_bytes()))
    }

    /// Marks the entry at `offset` deleted
    pub fn mark_deleted(&mut self, offset: u64) -> Result<(), FsError> {
        self.update_entry_bytes(offset, |raw| raw[0] = DELETED_ENTRY_MARKER)
    }

    fn update_entry_bytes(
        &mut self,
        offset: u64,
        update: impl FnOnce(&mut [u8]),
    ) -> Result<(), FsError> {
        let sector = offset / SECTOR_SIZE as u64;
        let in_sector = (offset % SECTOR_SIZE as u64) as usize;

        let mut sector_buffer = self.device.read_sector(sector);
        update(&mut sector_buffer[in_sector..in_sector + DIR_ENTRY_SIZE]);
        self.device.write_sector(sector, &sector_buffer)
    }

    /// Every live file entry, in directory order
    pub fn live_entries(&mut self) -> Vec<DirEntry83> {
        let entries_per_sector = SECTOR_SIZE / DIR_ENTRY_SIZE;
        let start_sector = self.geometry.first_root_dir_sector();
        let total_entries = self.geometry.root_dir_entries as usize;
        let mut result = Vec::new();

        'scan: for sector_offset in 0..self.geometry.root_dir_sectors() {
            let sector_buffer = self.device.read_sector(start_sector + sector_offset);

            for (i, raw) in sector_buffer.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
                if sector_offset as usize * entries_per_sector + i >= total_entries {
                    break 'scan;
                }

                let entry = DirEntry83::from_bytes(raw);
                if entry.is_free() {
                    break 'scan;
                }
                if !entry.is_deleted() && !entry.is_volume_label() && !entry.is_directory() {
                    result.push(entry);
                }
            }
        }

        result
    }
}
