//! FAT16 filesystem implementation
//!
//! A single flat root directory of 8.3 names over a fixed-geometry volume.
//! Files are always written and read whole.

use super::*;
use alloc::boxed::Box;

mod boot_sector;
mod constants;
mod dir_entry;
mod directory;
mod fat_entry;
mod fat_table;
mod file;
mod geometry;

pub use boot_sector::BootSector;
use constants::*;
pub use dir_entry::{normalize_name, DirEntry83};
pub use directory::DirSlot;
pub use fat_entry::FatEntry;
pub use geometry::Geometry;

use crate::filesys::block::CheckedDevice;

/// FAT16 filesystem driver
///
/// Owns its device from mount to unmount. All state lives on disk; nothing
/// is cached between calls apart from the geometry.
pub struct Fat16<'a> {
    /// Underlying block device, behind the bounds-checked sector layer
    device: CheckedDevice<'a>,
    /// Layout the volume was formatted or mounted with
    geometry: Geometry,
    /// Boot sector containing filesystem parameters
    boot_sector: BootSector,
}

impl<'a> Fat16<'a> {
    /// Lays down an empty volume on `device` and mounts it.
    ///
    /// Every sector of the volume is zeroed first, then the boot sector and
    /// the reserved entries of each FAT copy are written. Any device failure
    /// here means the device is unusable.
    pub fn format(device: Box<dyn BlockDevice + 'a>, geometry: Geometry) -> Result<Self, FsError> {
        Self::check_device(&*device, &geometry)?;
        let mut device = CheckedDevice::new(device, geometry.total_sectors as u64);

        log::info!(
            "formatting FAT16 volume: {} sectors, data starts at sector {}",
            geometry.total_sectors,
            geometry.first_data_sector()
        );

        let zero_block = [0u8; SECTOR_SIZE];
        for lba in 0..geometry.total_sectors as u64 {
            device.write_sector(lba, &zero_block)?;
        }

        let boot_sector = BootSector::new(&geometry);
        device.write_sector(0, &boot_sector.to_bytes())?;

        let mut fat_block = [0u8; SECTOR_SIZE];
        // First two FAT entries are reserved
        fat_block[0] = boot_sector.media_type;
        fat_block[1] = 0xFF;
        fat_block[2..4].copy_from_slice(&FAT_EOC.to_le_bytes());

        for copy in 0..geometry.fat_count {
            device.write_sector(geometry.fat_copy_start(copy), &fat_block)?;
        }

        Self::mount(device.into_inner(), geometry)
    }

    /// Mounts an already formatted volume.
    ///
    /// The boot sector is read straight from the device so a failing disk is
    /// reported instead of looking unformatted.
    pub fn mount(mut device: Box<dyn BlockDevice + 'a>, geometry: Geometry) -> Result<Self, FsError> {
        Self::check_device(&*device, &geometry)?;

        let mut boot_sector_data = [0u8; SECTOR_SIZE];
        device.read_block(0, &mut boot_sector_data)?;
        let boot_sector = BootSector::parse(&boot_sector_data)?;

        if !boot_sector.matches(&geometry) {
            log::warn!("boot sector does not describe the requested geometry");
            return Err(FsError::GeometryMismatch);
        }

        log::info!(
            "mounted FAT16 volume {:?}, {} clusters",
            core::str::from_utf8(&boot_sector.volume_label).unwrap_or("?"),
            geometry.cluster_limit() - FIRST_DATA_CLUSTER as u32
        );

        Ok(Fat16 {
            device: CheckedDevice::new(device, geometry.total_sectors as u64),
            geometry,
            boot_sector,
        })
    }

    /// Releases the device.
    pub fn unmount(self) -> Box<dyn BlockDevice + 'a> {
        self.device.into_inner()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot_sector
    }

    /// Direct device access, bypassing the bounds-checked layer.
    pub fn device(&mut self) -> &mut (dyn BlockDevice + 'a) {
        self.device.raw()
    }

    fn check_device(device: &dyn BlockDevice, geometry: &Geometry) -> Result<(), FsError> {
        if device.block_size() != SECTOR_SIZE
            || geometry.sectors_per_cluster == 0
            || geometry.fat_count == 0
            || geometry.sectors_per_fat == 0
        {
            return Err(FsError::GeometryMismatch);
        }
        if device.total_blocks() < geometry.total_sectors as u64
            || geometry.first_data_sector() >= geometry.total_sectors as u64
        {
            return Err(FsError::DeviceTooSmall);
        }
        Ok(())
    }
}

impl FileSystem for Fat16<'_> {
    fn write_file(&mut self, name: &str, data: &[u8]) -> Result<(), FsError> {
        let short = normalize_name(name)?;
        let file_size = u32::try_from(data.len()).map_err(|_| FsError::DiskFull)?;

        let (offset, replacing) = match self.find_entry(&short) {
            DirSlot::Existing { offset, entry } => {
                if self.geometry.is_data_cluster(entry.start_cluster) {
                    if let Err(err) = self.free_chain(entry.start_cluster) {
                        // Part of the old chain may already be free
                        self.write_entry(offset, &short, 0, 0)?;
                        return Err(err);
                    }
                }
                (offset, true)
            }
            DirSlot::Vacant { offset } => (offset, false),
            DirSlot::Full => return Err(FsError::DirectoryFull),
        };

        let start_cluster = match self.write_chain(data) {
            Ok(cluster) => cluster,
            Err(err) => {
                // The old chain is already gone; leave an empty file behind
                if replacing {
                    self.write_entry(offset, &short, 0, 0)?;
                }
                return Err(err);
            }
        };

        self.write_entry(offset, &short, start_cluster, file_size)?;
        log::debug!(
            "wrote {} ({} bytes, first cluster {})",
            name,
            file_size,
            start_cluster
        );
        Ok(())
    }

    fn read_file(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, FsError> {
        let short = normalize_name(name)?;
        let entry = match self.find_entry(&short) {
            DirSlot::Existing { entry, .. } => entry,
            _ => return Err(FsError::NotFound),
        };

        if entry.file_size == 0 {
            return Ok(0);
        }
        Ok(self.read_chain(entry.start_cluster, entry.file_size as usize, buf))
    }

    fn remove_file(&mut self, name: &str) -> Result<(), FsError> {
        let short = normalize_name(name)?;
        let (offset, entry) = match self.find_entry(&short) {
            DirSlot::Existing { offset, entry } => (offset, entry),
            _ => return Err(FsError::NotFound),
        };

        if self.geometry.is_data_cluster(entry.start_cluster) {
            self.free_chain(entry.start_cluster)?;
        }
        self.mark_deleted(offset)
    }

    fn read_dir(&mut self) -> Result<Vec<DirEntry>, FsError> {
        Ok(self
            .live_entries()
            .iter()
            .map(|entry| DirEntry {
                name: entry.get_name(),
                metadata: FileMetadata {
                    size: entry.file_size as u64,
                    start_cluster: entry.start_cluster,
                    read_only: entry.is_read_only(),
                },
            })
            .collect())
    }

    fn metadata(&mut self, name: &str) -> Result<FileMetadata, FsError> {
        let short = normalize_name(name)?;
        match self.find_entry(&short) {
            DirSlot::Existing { entry, .. } => Ok(FileMetadata {
                size: entry.file_size as u64,
                start_cluster: entry.start_cluster,
                read_only: entry.is_read_only(),
            }),
            _ => Err(FsError::NotFound),
        }
    }
}
