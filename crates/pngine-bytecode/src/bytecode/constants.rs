//! Bytecode format constants.

/// Magic bytes identifying a PNGine module.
pub const MAGIC: [u8; 4] = *b"PNGB";

/// Format version written by this crate.
pub const VERSION: u16 = 3;

/// Oldest format version this crate can read.
pub const MIN_VERSION: u16 = 1;

/// Largest value representable by the varint codec (30 bits).
pub const VARINT_MAX: u32 = 0x3FFF_FFFF;

/// Maximum operand count of any instruction.
pub const MAX_OPERANDS: usize = 8;

/// Header flag bits.
pub mod flags {
    pub const HAS_INTERPRETER: u16 = 1 << 0;
    pub const HAS_UNIFORMS: u16 = 1 << 1;
    pub const HAS_ANIMATION: u16 = 1 << 2;
    pub const HAS_WGSL: u16 = 1 << 3;
}

/// Header length in bytes for a given format version.
pub fn header_len(version: u16) -> Option<usize> {
    match version {
        1 => Some(28),
        2 => Some(36),
        3 => Some(52),
        _ => None,
    }
}
