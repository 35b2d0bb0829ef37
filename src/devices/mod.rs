//! Hardware the storage layer talks to.
//!
//! - `ata`: polling PIO driver for the disk holding the volume
//! - `serial`: COM1, where log output goes

pub mod ata;
pub mod serial;

pub use ata::{AtaBus, AtaPio, AtaStatus, Drive, PortBus};
