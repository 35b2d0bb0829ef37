//! Block device implementations and the bounds-checked sector layer.

pub mod checked;
pub mod memory;

pub use checked::CheckedDevice;
pub use memory::MemoryBlockDevice;
