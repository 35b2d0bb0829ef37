//! FAT16 directory entry structure and short-name handling

use super::constants::*;
use crate::filesys::FsError;
use arrayvec::ArrayString;

/// 8.3 format directory entry (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry83 {
    /// 8 character filename
    pub name: [u8; 8],

    /// 3 character extension
    pub ext: [u8; 3],

    /// File attributes (read-only, directory, etc)
    pub attributes: u8,

    /// Reserved
    pub reserved: [u8; 10],

    /// Modification time
    pub time: u16,

    /// Modification date
    pub date: u16,

    /// First cluster number
    pub start_cluster: u16,

    /// File size in bytes
    pub file_size: u32,
}

/// Converts `name` into the space-padded, uppercased 11-byte on-disk form.
///
/// Splits on the first `.`; the base keeps at most 8 bytes and the extension
/// at most 3, anything longer is cut off. Control bytes are rejected since a
/// leading 0x00 would read back as the end of the directory.
pub fn normalize_name(name: &str) -> Result<[u8; 11], FsError> {
    if name.bytes().any(|b| b < 0x20) {
        return Err(FsError::InvalidName);
    }

    let (base, ext) = match name.find('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (name, ""),
    };

    if base.is_empty() {
        return Err(FsError::InvalidName);
    }

    let mut short = [b' '; 11];
    for (dst, src) in short[..MAX_FILENAME_LENGTH].iter_mut().zip(base.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
    let ext_field = &mut short[MAX_FILENAME_LENGTH..MAX_FILENAME_LENGTH + MAX_EXTENSION_LENGTH];
    for (dst, src) in ext_field.iter_mut().zip(ext.bytes()) {
        *dst = src.to_ascii_uppercase();
    }

    if short[0] == DELETED_ENTRY_MARKER {
        short[0] = KANJI_E5_ESCAPE;
    }
    Ok(short)
}

impl DirEntry83 {
    /// Creates an archive file entry from an already normalized name
    pub fn new_file(short_name: &[u8; 11], start_cluster: u16, file_size: u32) -> Self {
        let mut entry = Self {
            name: [0x20; 8],
            ext: [0x20; 3],
            attributes: ATTR_ARCHIVE,
            reserved: [0; 10],
            time: 0,
            date: 0,
            start_cluster,
            file_size,
        };
        entry.name.copy_from_slice(&short_name[..8]);
        entry.ext.copy_from_slice(&short_name[8..]);
        entry
    }

    pub fn from_bytes(raw: &[u8]) -> Self {
        let le16 = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);

        let mut entry = Self {
            name: [0; 8],
            ext: [0; 3],
            attributes: raw[11],
            reserved: [0; 10],
            time: le16(22),
            date: le16(24),
            start_cluster: le16(26),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        };
        entry.name.copy_from_slice(&raw[0..8]);
        entry.ext.copy_from_slice(&raw[8..11]);
        entry.reserved.copy_from_slice(&raw[12..22]);
        entry
    }

    pub fn to_bytes(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[0..8].copy_from_slice(&self.name);
        raw[8..11].copy_from_slice(&self.ext);
        raw[11] = self.attributes;
        raw[12..22].copy_from_slice(&self.reserved);
        raw[22..24].copy_from_slice(&self.time.to_le_bytes());
        raw[24..26].copy_from_slice(&self.date.to_le_bytes());
        raw[26..28].copy_from_slice(&self.start_cluster.to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
        raw
    }

    /// The 11 name bytes as stored on disk
    pub fn short_name(&self) -> [u8; 11] {
        let mut short = [0u8; 11];
        short[..8].copy_from_slice(&self.name);
        short[8..].copy_from_slice(&self.ext);
        short
    }

    /// Returns true if entry is marked as deleted
    pub fn is_deleted(&self) -> bool {
        self.name[0] == DELETED_ENTRY_MARKER
    }

    /// Returns true if entry is empty/unused
    pub fn is_free(&self) -> bool {
        self.name[0] == END_OF_DIR_MARKER
    }

    /// Returns true if entry is a directory
    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & ATTR_VOLUME_ID != 0
    }

    pub fn is_read_only(&self) -> bool {
        self.attributes & ATTR_READ_ONLY != 0
    }

    /// Returns the filename as `NAME.EXT`, or `NAME` without an extension
    pub fn get_name(&self) -> ArrayString<12> {
        let name_end = self.name.iter().rposition(|&x| x != 0x20).map_or(0, |p| p + 1);
        let ext_end = self.ext.iter().rposition(|&x| x != 0x20).map_or(0, |p| p + 1);

        let mut out = ArrayString::new();
        for (i, &b) in self.name[..name_end].iter().enumerate() {
            let b = if i == 0 && b == KANJI_E5_ESCAPE { DELETED_ENTRY_MARKER } else { b };
            out.push(if b.is_ascii() { b as char } else { '?' });
        }
        if ext_end > 0 {
            out.push('.');
            for &b in &self.ext[..ext_end] {
                out.push(if b.is_ascii() { b as char } else { '?' });
            }
        }
        out
    }
}
