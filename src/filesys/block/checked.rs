//! Bounds-checked sector access
//!
//! Sits between the filesystem and the raw device. Sectors past the end of the
//! volume read as zeros and absorb writes, and a failed device read is also
//! handed back as a zero sector. Callers that need to tell a hardware failure
//! apart from empty data must go through [`CheckedDevice::raw`].

use crate::filesys::{BlockDevice, FsError, Sector, SECTOR_SIZE};
use alloc::boxed::Box;
use core::result::Result;

pub struct CheckedDevice<'a> {
    device: Box<dyn BlockDevice + 'a>,
    /// Sectors belonging to the volume, `[0, total_sectors)`
    total_sectors: u64,
}

impl<'a> CheckedDevice<'a> {
    pub fn new(device: Box<dyn BlockDevice + 'a>, total_sectors: u64) -> Self {
        Self {
            device,
            total_sectors,
        }
    }

    pub fn total_sectors(&self) -> u64 {
        self.total_sectors
    }

    /// Reads `lba`, or an all-zero sector if it is out of range or unreadable.
    pub fn read_sector(&mut self, lba: u64) -> Sector {
        let mut sector = [0u8; SECTOR_SIZE];
        if lba >= self.total_sectors {
            log::warn!("read of sector {} past volume end, zero-filled", lba);
            return sector;
        }

        if let Err(err) = self.device.read_block(lba, &mut sector) {
            log::warn!("read of sector {} failed ({}), zero-filled", lba, err);
            sector.fill(0);
        }
        sector
    }

    /// Writes `lba`. Out-of-range writes are dropped and report success.
    pub fn write_sector(&mut self, lba: u64, data: &Sector) -> Result<(), FsError> {
        if lba >= self.total_sectors {
            log::warn!("write of sector {} past volume end dropped", lba);
            return Ok(());
        }
        self.device.write_block(lba, data)
    }

    /// Unchecked access for paths that need the device's own result.
    pub fn raw(&mut self) -> &mut (dyn BlockDevice + 'a) {
        &mut *self.device
    }

    pub fn into_inner(self) -> Box<dyn BlockDevice + 'a> {
        self.device
    }
}
