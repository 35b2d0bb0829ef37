//! Persistent storage for the TAOS kernel: an ATA PIO disk driver and a
//! FAT16 volume with one flat root directory on top of it.
//!
//! ```text
//! AtaPio (devices::ata) -> CheckedDevice -> Fat16 { FAT table, directory, file I/O }
//! ```
//!
//! Applications only see [`filesys::FileSystem`].

#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
extern crate alloc;

pub mod constants;
pub mod devices;
pub mod filesys;
pub mod logging;

pub use devices::serial;
pub use filesys::{fat16::Fat16, FileSystem, FsError};

pub mod prelude {
    pub use crate::filesys::fat16::{Fat16, Geometry};
    pub use crate::filesys::{BlockDevice, FileSystem, FsError};
    pub use crate::serial_print;
    pub use crate::serial_println;
}
