use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::result::Result;

pub mod block;
pub mod fat16;

/// Size of a disk sector in bytes
pub const SECTOR_SIZE: usize = 512;

/// One sector worth of bytes
pub type Sector = [u8; SECTOR_SIZE];

// Define error types for the filesystem operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Device stayed busy past the polling budget
    DeviceTimeout,
    /// Device reported ERR or DF, or no device answered
    DeviceError,
    /// Sector address outside the device
    OutOfRange,
    /// Buffer is not exactly one sector long
    InvalidBuffer,
    /// No free cluster left for allocation
    DiskFull,
    /// No free or deleted slot left in the root directory
    DirectoryFull,
    NotFound,
    InvalidName,
    /// Boot sector is not a FAT16 boot sector
    NotFormatted,
    /// Boot sector describes a different layout than requested
    GeometryMismatch,
    /// Device has fewer sectors than the volume needs
    DeviceTooSmall,
}

impl core::fmt::Display for FsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FsError::DeviceTimeout => write!(f, "Device timed out"),
            FsError::DeviceError => write!(f, "Device reported an error"),
            FsError::OutOfRange => write!(f, "Sector out of range"),
            FsError::InvalidBuffer => write!(f, "Buffer must be exactly one sector"),
            FsError::DiskFull => write!(f, "Disk full"),
            FsError::DirectoryFull => write!(f, "Root directory full"),
            FsError::NotFound => write!(f, "File not found"),
            FsError::InvalidName => write!(f, "Invalid file name"),
            FsError::NotFormatted => write!(f, "Volume is not formatted as FAT16"),
            FsError::GeometryMismatch => write!(f, "Volume geometry does not match"),
            FsError::DeviceTooSmall => write!(f, "Device too small for volume"),
        }
    }
}

// Core traits for filesystem abstraction

/// Represents a block device that can be read from and written to
pub trait BlockDevice: Send + Sync {
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError>;
    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError>;
    fn block_size(&self) -> usize;
    fn total_blocks(&self) -> u64;
}

/// Represents a directory entry
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Display name, `NAME.EXT`
    pub name: ArrayString<12>,
    pub metadata: FileMetadata,
}

/// File metadata information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub start_cluster: u16,
    pub read_only: bool,
}

/// The whole-file interface handed to applications such as the editor and
/// the calculator. Names are short 8.3 names in a single flat directory.
pub trait FileSystem {
    /// Replaces the contents of `name`, creating it if needed.
    fn write_file(&mut self, name: &str, data: &[u8]) -> Result<(), FsError>;
    /// Copies up to `buf.len()` bytes of `name` into `buf` and returns the
    /// number copied. A short buffer truncates silently.
    fn read_file(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, FsError>;
    fn remove_file(&mut self, name: &str) -> Result<(), FsError>;
    fn read_dir(&mut self) -> Result<Vec<DirEntry>, FsError>;
    fn metadata(&mut self, name: &str) -> Result<FileMetadata, FsError>;
}
