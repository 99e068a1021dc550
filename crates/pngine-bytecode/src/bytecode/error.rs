//! Decode and encode errors shared by the instruction codec and sections.

use super::instructions::Opcode;

/// Error decoding untrusted bytes (bytecode, descriptors, expressions).
///
/// Offsets are relative to the slice being decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },
    #[error("non-canonical varint at offset {offset}")]
    NonCanonicalVarint { offset: usize },
    #[error("invalid {what} value {value} at offset {offset}")]
    InvalidValue {
        what: &'static str,
        value: u32,
        offset: usize,
    },
    #[error("invalid UTF-8 in {what}")]
    InvalidUtf8 { what: &'static str },
    #[error("{count} trailing bytes after {what}")]
    TrailingBytes { what: &'static str, count: usize },
}

impl DecodeError {
    /// Shift the reported offset by `base` (used when a sub-slice error is
    /// reported relative to its enclosing buffer).
    pub fn offset_by(self, base: usize) -> Self {
        match self {
            Self::UnexpectedEof { offset } => Self::UnexpectedEof {
                offset: offset + base,
            },
            Self::UnknownOpcode { offset, byte } => Self::UnknownOpcode {
                offset: offset + base,
                byte,
            },
            Self::NonCanonicalVarint { offset } => Self::NonCanonicalVarint {
                offset: offset + base,
            },
            Self::InvalidValue {
                what,
                value,
                offset,
            } => Self::InvalidValue {
                what,
                value,
                offset: offset + base,
            },
            other => other,
        }
    }

    /// Byte offset of the first violation, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEof { offset }
            | Self::UnknownOpcode { offset, .. }
            | Self::NonCanonicalVarint { offset }
            | Self::InvalidValue { offset, .. } => Some(*offset),
            Self::InvalidUtf8 { .. } | Self::TrailingBytes { .. } => None,
        }
    }
}

/// Error encoding values into the wire format.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("value {0} does not fit in a varint (max 0x3fffffff)")]
    VarintOverflow(u32),
    #[error("{opcode:?} operand `{operand}` value {value} does not fit in a byte")]
    ByteOverflow {
        opcode: Opcode,
        operand: &'static str,
        value: u32,
    },
    #[error("{what} count {count} exceeds the format limit")]
    TooMany { what: &'static str, count: usize },
    #[error("{opcode:?} takes {expected} operands, got {got}")]
    OperandCount {
        opcode: Opcode,
        expected: usize,
        got: usize,
    },
}
