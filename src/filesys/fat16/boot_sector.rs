//! FAT16 Boot Sector Structure

use super::{constants::*, geometry::Geometry};
use crate::filesys::{FsError, Sector};

/// Represents the boot sector of a FAT16 filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSector {
    /// Jump instruction to boot code
    pub jump_boot: [u8; 3],

    /// Name of the system that formatted the volume
    pub oem_name: [u8; 8],

    /// Number of bytes per sector
    pub bytes_per_sector: u16,

    /// Number of sectors per cluster
    pub sectors_per_cluster: u8,

    /// Number of reserved sectors at start of volume
    /// Including the boot sector. Typically 1 for FAT16
    pub reserved_sectors: u16,

    /// Number of FAT copies
    pub fat_count: u8,

    /// Maximum number of root directory entries
    pub root_dir_entries: u16,

    /// Total number of sectors (16-bit)
    /// Zero when the count does not fit, see total_sectors_32
    pub total_sectors_16: u16,

    /// Media type descriptor
    pub media_type: u8,

    /// Sectors per FAT
    /// Size of each FAT copy in sectors
    pub sectors_per_fat: u16,

    /// Sectors per track for interrupt 0x13
    pub sectors_per_track: u16,

    /// Number of heads for interrupt 0x13
    pub head_count: u16,

    /// Number of hidden sectors preceding the partition
    pub hidden_sectors: u32,

    /// Total number of sectors (32-bit)
    pub total_sectors_32: u32,

    /// INT 13h drive number
    pub drive_number: u8,

    /// Extended boot signature
    pub boot_signature: u8,

    /// Volume serial number
    pub volume_id: u32,

    /// Volume label
    pub volume_label: [u8; 11],

    /// Filesystem type string
    pub fs_type: [u8; 8],
}

impl BootSector {
    /// Builds the boot sector describing `geometry`
    pub fn new(geometry: &Geometry) -> Self {
        let total = geometry.total_sectors;
        Self {
            jump_boot: [0xEB, 0x3C, 0x90], // Standard boot jump
            oem_name: OEM_NAME,
            bytes_per_sector: SECTOR_SIZE as u16,
            sectors_per_cluster: geometry.sectors_per_cluster,
            reserved_sectors: geometry.reserved_sectors,
            fat_count: geometry.fat_count,
            root_dir_entries: geometry.root_dir_entries,
            total_sectors_16: if total < 65536 { total as u16 } else { 0 },
            media_type: MEDIA_DESCRIPTOR,
            sectors_per_fat: geometry.sectors_per_fat,
            sectors_per_track: 63,
            head_count: 255,
            hidden_sectors: 0,
            total_sectors_32: if total >= 65536 { total } else { 0 },
            drive_number: 0x80, // Hard disk
            boot_signature: EXTENDED_BOOT_SIGNATURE,
            volume_id: 0x12345678,
            volume_label: VOLUME_LABEL,
            fs_type: FS_TYPE,
        }
    }

    /// Serializes into a full sector, including the 0x55AA trailer
    pub fn to_bytes(&self) -> Sector {
        let mut buf = [0u8; SECTOR_SIZE];
        buf[0..3].copy_from_slice(&self.jump_boot);
        buf[3..11].copy_from_slice(&self.oem_name);
        buf[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        buf[13] = self.sectors_per_cluster;
        buf[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        buf[16] = self.fat_count;
        buf[17..19].copy_from_slice(&self.root_dir_entries.to_le_bytes());
        buf[19..21].copy_from_slice(&self.total_sectors_16.to_le_bytes());
        buf[21] = self.media_type;
        buf[22..24].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        buf[24..26].copy_from_slice(&self.sectors_per_track.to_le_bytes());
        buf[26..28].copy_from_slice(&self.head_count.to_le_bytes());
        buf[28..32].copy_from_slice(&self.hidden_sectors.to_le_bytes());
        buf[32..36].copy_from_slice(&self.total_sectors_32.to_le_bytes());
        buf[36] = self.drive_number;
        buf[38] = self.boot_signature;
        buf[39..43].copy_from_slice(&self.volume_id.to_le_bytes());
        buf[43..54].copy_from_slice(&self.volume_label);
        buf[54..62].copy_from_slice(&self.fs_type);
        buf[510..512].copy_from_slice(&BOOT_SIGNATURE);
        buf
    }

    /// Parses a boot sector, rejecting anything that is not FAT16
    pub fn parse(buf: &Sector) -> Result<Self, FsError> {
        if buf[510..512] != BOOT_SIGNATURE || buf[54..62] != FS_TYPE {
            return Err(FsError::NotFormatted);
        }

        let le16 = |at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]);
        let le32 = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        let mut boot = Self {
            jump_boot: [0; 3],
            oem_name: [0; 8],
            bytes_per_sector: le16(11),
            sectors_per_cluster: buf[13],
            reserved_sectors: le16(14),
            fat_count: buf[16],
            root_dir_entries: le16(17),
            total_sectors_16: le16(19),
            media_type: buf[21],
            sectors_per_fat: le16(22),
            sectors_per_track: le16(24),
            head_count: le16(26),
            hidden_sectors: le32(28),
            total_sectors_32: le32(32),
            drive_number: buf[36],
            boot_signature: buf[38],
            volume_id: le32(39),
            volume_label: [0; 11],
            fs_type: FS_TYPE,
        };
        boot.jump_boot.copy_from_slice(&buf[0..3]);
        boot.oem_name.copy_from_slice(&buf[3..11]);
        boot.volume_label.copy_from_slice(&buf[43..54]);
        Ok(boot)
    }

    /// Total sectors from whichever field is in use
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    /// True if this boot sector describes exactly `geometry`
    pub fn matches(&self, geometry: &Geometry) -> bool {
        self.bytes_per_sector as usize == SECTOR_SIZE
            && self.sectors_per_cluster == geometry.sectors_per_cluster
            && self.reserved_sectors == geometry.reserved_sectors
            && self.fat_count == geometry.fat_count
            && self.root_dir_entries == geometry.root_dir_entries
            && self.sectors_per_fat == geometry.sectors_per_fat
            && self.total_sectors() == geometry.total_sectors
    }
}
