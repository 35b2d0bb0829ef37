//! ATA PIO register offsets, commands and polling limits.

/// Data register, 16-bit transfers.
pub const REG_DATA: u16 = 0;
/// Error register (read).
pub const REG_ERROR: u16 = 1;
pub const REG_SECTOR_COUNT: u16 = 2;
pub const REG_LBA_LO: u16 = 3;
pub const REG_LBA_MID: u16 = 4;
pub const REG_LBA_HI: u16 = 5;
/// Drive select and LBA bits 24..28.
pub const REG_DRIVE_HEAD: u16 = 6;
/// Status on read, command on write.
pub const REG_STATUS_COMMAND: u16 = 7;

pub const CMD_READ_SECTORS: u8 = 0x20;
pub const CMD_WRITE_SECTORS: u8 = 0x30;
pub const CMD_CACHE_FLUSH: u8 = 0xE7;
pub const CMD_IDENTIFY: u8 = 0xEC;

/// Drive/head byte for the master drive in LBA mode.
pub const DRIVE_MASTER_LBA: u8 = 0xE0;
/// Drive/head byte for the slave drive in LBA mode.
pub const DRIVE_SLAVE_LBA: u8 = 0xF0;

/// Highest sector count addressable with 28-bit LBA.
pub const LBA28_MAX_SECTORS: u64 = 1 << 28;

/// Number of 16-bit words moved per sector.
pub const WORDS_PER_SECTOR: usize = 256;

/// Status reads issued after a drive select before the device is trusted (~400ns).
pub const SELECT_SETTLE_READS: usize = 4;

/// Status polls allowed per wait before giving up with a timeout.
pub const ATA_POLL_BUDGET: usize = 100_000;
