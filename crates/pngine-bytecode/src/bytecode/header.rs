//! Module file header.
//!
//! v3 layout (52 bytes, little-endian):
//! - 0-15: identity (magic, version, flags, total_size, checksum)
//! - 16-27: core section offsets (strings, data, bytecode)
//! - 28-35: interpreter offset and length (v2+)
//! - 36-51: capabilities and reflection table offsets (v3)
//!
//! Older versions simply stop earlier; their missing fields read as zero.

use super::constants::{MAGIC, MIN_VERSION, VERSION, header_len};
use super::module::ModuleError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u16,
    /// Total file size in bytes.
    pub total_size: u32,
    /// CRC32 of everything after the header.
    pub checksum: u32,

    pub strings_offset: u32,
    pub data_offset: u32,
    pub bytecode_offset: u32,

    pub interpreter_offset: u32,
    pub interpreter_len: u32,

    pub capabilities: u32,
    /// 0 when the module carries no WGSL table.
    pub wgsl_offset: u32,
    /// 0 when the module carries no uniform table.
    pub uniforms_offset: u32,
    /// 0 when the module carries no animation table.
    pub animation_offset: u32,
}

#[inline]
fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl Header {
    /// Parse the header at the start of `bytes`.
    ///
    /// Magic and version are checked before anything else is read, so a
    /// foreign or future file reports exactly that.
    pub fn parse(bytes: &[u8]) -> Result<Self, ModuleError> {
        if bytes.len() < 4 {
            return Err(ModuleError::FileTooSmall(bytes.len()));
        }
        if bytes[0..4] != MAGIC {
            return Err(ModuleError::InvalidMagic);
        }
        if bytes.len() < 6 {
            return Err(ModuleError::FileTooSmall(bytes.len()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        let len = match header_len(version) {
            Some(len) if version >= MIN_VERSION => len,
            _ => return Err(ModuleError::UnsupportedVersion(version)),
        };
        if bytes.len() < len {
            return Err(ModuleError::FileTooSmall(bytes.len()));
        }

        let mut header = Self {
            version,
            flags: u16::from_le_bytes([bytes[6], bytes[7]]),
            total_size: u32_at(bytes, 8),
            checksum: u32_at(bytes, 12),
            strings_offset: u32_at(bytes, 16),
            data_offset: u32_at(bytes, 20),
            bytecode_offset: u32_at(bytes, 24),
            ..Self::default()
        };

        if version >= 2 {
            header.interpreter_offset = u32_at(bytes, 28);
            header.interpreter_len = u32_at(bytes, 32);
        }
        if version >= 3 {
            header.capabilities = u32_at(bytes, 36);
            header.wgsl_offset = u32_at(bytes, 40);
            header.uniforms_offset = u32_at(bytes, 44);
            header.animation_offset = u32_at(bytes, 48);
        }

        Ok(header)
    }

    /// Encode as a current-version header.
    pub fn to_bytes(&self) -> [u8; 52] {
        let mut bytes = [0u8; 52];
        bytes[0..4].copy_from_slice(&MAGIC);
        bytes[4..6].copy_from_slice(&VERSION.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.total_size.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.strings_offset.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.data_offset.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.bytecode_offset.to_le_bytes());
        bytes[28..32].copy_from_slice(&self.interpreter_offset.to_le_bytes());
        bytes[32..36].copy_from_slice(&self.interpreter_len.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.capabilities.to_le_bytes());
        bytes[40..44].copy_from_slice(&self.wgsl_offset.to_le_bytes());
        bytes[44..48].copy_from_slice(&self.uniforms_offset.to_le_bytes());
        bytes[48..52].copy_from_slice(&self.animation_offset.to_le_bytes());
        bytes
    }

    /// Header length for this header's version.
    pub fn byte_len(&self) -> usize {
        header_len(self.version).unwrap_or(0)
    }
}
