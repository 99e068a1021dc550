//! Capability bits a module declares in its header.
//!
//! Hosts use them to refuse modules they cannot run before dispatching
//! anything. The declared set must match what the bytecode actually uses.

use std::fmt;

use super::codec;
use super::error::DecodeError;
use super::instructions::Opcode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(pub u32);

impl Capabilities {
    pub const COMPUTE: Self = Self(0x01);
    pub const ANIMATION: Self = Self(0x02);
    pub const TIME_UNIFORM: Self = Self(0x04);
    pub const POOLS: Self = Self(0x08);
    pub const PROCEDURAL: Self = Self(0x10);
    pub const INDEXED_DRAW: Self = Self(0x20);
    pub const PASS_DEFS: Self = Self(0x40);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::COMPUTE, "compute"),
        (Self::ANIMATION, "animation"),
        (Self::TIME_UNIFORM, "time-uniform"),
        (Self::POOLS, "pools"),
        (Self::PROCEDURAL, "procedural"),
        (Self::INDEXED_DRAW, "indexed-draw"),
        (Self::PASS_DEFS, "pass-defs"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Capability implied by a single opcode, if any.
    pub fn of_opcode(opcode: Opcode) -> Self {
        match opcode {
            Opcode::CreateComputePipeline | Opcode::BeginComputePass | Opcode::Dispatch => {
                Self::COMPUTE
            }
            Opcode::WriteTimeUniform => Self::TIME_UNIFORM,
            Opcode::SetVertexBufferPool | Opcode::SetBindGroupPool => Self::POOLS,
            Opcode::CreateTypedArray
            | Opcode::FillConstant
            | Opcode::FillLinear
            | Opcode::FillElementIndex
            | Opcode::FillRandom
            | Opcode::FillExpression
            | Opcode::WriteBufferFromArray => Self::PROCEDURAL,
            Opcode::SetIndexBuffer | Opcode::DrawIndexed => Self::INDEXED_DRAW,
            Opcode::DefinePass | Opcode::EndPassDef | Opcode::ExecPass => Self::PASS_DEFS,
            _ => Self::empty(),
        }
    }

    /// Capabilities used by a bytecode stream. Animation is a property of
    /// the reflection tables and is never inferred here.
    pub fn scan(bytecode: &[u8]) -> Result<Self, DecodeError> {
        let mut caps = Self::empty();
        let mut pos = 0;
        while pos < bytecode.len() {
            let (opcode, len) = codec::skip(bytecode, pos)?;
            caps.insert(Self::of_opcode(opcode));
            pos += len;
        }
        Ok(caps)
    }

    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(cap, _)| self.contains(*cap))
            .map(|(_, name)| name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .into_iter()
            .find(|(_, n)| *n == name)
            .map(|(cap, _)| cap)
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for name in self.names() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}
