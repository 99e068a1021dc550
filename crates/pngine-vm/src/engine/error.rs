//! Runtime errors for bytecode dispatch.

use pngine_bytecode::bytecode::{DecodeError, ExprError, Opcode};

use super::backend::BackendError;
use super::datagen::DataGenError;
use super::resources::ResourceError;

/// Errors raised while executing an instruction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("invalid descriptor in data entry {data}: {source}")]
    Descriptor { data: u32, source: DecodeError },

    #[error("data entry {0} does not exist")]
    MissingData(u32),

    #[error("string {0} does not exist")]
    MissingString(u32),

    #[error("data entry {data} must be {expected} bytes for {what}, got {actual}")]
    DataSize {
        what: &'static str,
        data: u32,
        expected: usize,
        actual: usize,
    },

    #[error("shader source in data entry {0} is not valid UTF-8")]
    ShaderUtf8(u32),

    #[error("invalid {what} value {value}")]
    InvalidEnum { what: &'static str, value: u32 },

    #[error("{op} {reason}")]
    InvalidState {
        op: &'static str,
        reason: &'static str,
    },

    #[error("write of {len} bytes at offset {offset} exceeds buffer {buffer} of {size} bytes")]
    OutOfBounds {
        buffer: u32,
        offset: u32,
        len: usize,
        size: u32,
    },

    #[error("time uniform size {0} must be 4, 8, 12 or 16")]
    TimeUniformSize(u32),

    #[error(transparent)]
    DataGen(#[from] DataGenError),

    #[error("invalid expression in data entry {data}: {source}")]
    Expr { data: u32, source: ExprError },

    #[error("pass {0} is not defined")]
    UnknownPass(u32),

    #[error("frame {0} not found")]
    FrameNotFound(String),

    #[error("malformed frame structure: {0}")]
    Structure(&'static str),

    #[error("execution limit exceeded ({0} instructions)")]
    ExecFuelExhausted(u32),
}

/// A runtime error located at the instruction that raised it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at offset {offset}{})", opcode_suffix(.opcode))]
pub struct DispatchError {
    /// Byte offset of the failing instruction within the bytecode.
    pub offset: usize,
    /// `None` when the opcode byte itself could not be decoded.
    pub opcode: Option<Opcode>,
    #[source]
    pub kind: RuntimeError,
}

fn opcode_suffix(opcode: &Option<Opcode>) -> String {
    match opcode {
        Some(op) => format!(", {}", op.mnemonic()),
        None => String::new(),
    }
}

impl DispatchError {
    pub fn new(offset: usize, opcode: Option<Opcode>, kind: impl Into<RuntimeError>) -> Self {
        Self {
            offset,
            opcode,
            kind: kind.into(),
        }
    }
}
