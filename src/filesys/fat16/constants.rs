//! FAT16 filesystem constants

pub use crate::filesys::SECTOR_SIZE;

/// Size of FAT entry in bytes (16-bit)
pub const FAT_ENTRY_SIZE: usize = 2;

/// Size of a directory entry in bytes
pub const DIR_ENTRY_SIZE: usize = 32;

/// Maximum number of root directory entries
pub const ROOT_DIR_ENTRIES: usize = 512;

/// Total sectors on the default volume
pub const TOTAL_SECTORS: u32 = 512;

/// Sectors per cluster on the default volume
pub const SECTORS_PER_CLUSTER: u8 = 1;

/// Reserved sectors, just the boot sector
pub const RESERVED_SECTORS: u16 = 1;

/// Number of FAT copies
pub const FAT_COUNT: u8 = 2;

/// Size of each FAT copy in sectors
pub const SECTORS_PER_FAT: u16 = 4;

/// Maximum length of filename excluding extension
pub const MAX_FILENAME_LENGTH: usize = 8;

/// Maximum length of file extension
pub const MAX_EXTENSION_LENGTH: usize = 3;

/// File attribute: Read-only
pub const ATTR_READ_ONLY: u8 = 0x01;

/// File attribute: Volume label
pub const ATTR_VOLUME_ID: u8 = 0x08;

/// File attribute: Directory
pub const ATTR_DIRECTORY: u8 = 0x10;

/// File attribute: Archive
pub const ATTR_ARCHIVE: u8 = 0x20;

/// Marker for deleted directory entries
pub const DELETED_ENTRY_MARKER: u8 = 0xE5;

/// Marker for the first never-used directory entry
pub const END_OF_DIR_MARKER: u8 = 0x00;

/// Stand-in for a real leading 0xE5 byte in a name
pub const KANJI_E5_ESCAPE: u8 = 0x05;

/// FAT value of a free cluster
pub const FAT_FREE: u16 = 0x0000;

/// Lowest value read as end of chain
pub const FAT_EOC_MIN: u16 = 0xFFF8;

/// End of chain value this driver writes
pub const FAT_EOC: u16 = 0xFFFF;

/// First cluster number usable by files
pub const FIRST_DATA_CLUSTER: u16 = 2;

/// Media descriptor for a fixed disk
pub const MEDIA_DESCRIPTOR: u8 = 0xF8;

/// Extended boot signature
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;

/// Trailing boot sector signature at bytes 510..512
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

pub const OEM_NAME: [u8; 8] = *b"UTTAOS.0";
pub const VOLUME_LABEL: [u8; 11] = *b"NO NAME    ";
pub const FS_TYPE: [u8; 8] = *b"FAT16   ";
