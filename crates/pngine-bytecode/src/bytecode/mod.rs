//! PNGine bytecode: instruction set, module container and tooling.
//!
//! A module file is a fixed header followed by sections (strings, data,
//! reflection tables, bytecode, embedded interpreter). Bytecode is a flat
//! stream of variable-length instructions with no jumps.

mod asm;
mod builder;
mod capabilities;
mod codec;
mod constants;
mod cursor;
mod descriptors;
mod dump;
mod error;
mod expr;
mod header;
mod ids;
mod instructions;
mod module;
mod reflection;
mod sections;
pub mod varint;

pub use asm::{AsmError, Assembler, assemble};
pub use builder::ModuleBuilder;
pub use capabilities::Capabilities;
pub use codec::{
    Instructions, decode as decode_instruction, encode as encode_instruction, encode_all,
    encoded_len, from_values as instruction_from_values, instructions,
    skip as skip_instruction,
};
pub use constants::{MAGIC, MAX_OPERANDS, MIN_VERSION, VARINT_MAX, VERSION, flags, header_len};
pub use descriptors::{
    AddressMode, BindEntry, BindingKind, FilterMode, PrimitiveTopology, RenderPipelineDescriptor,
    SamplerDescriptor, TextureDescriptor, TextureFormat, decode_bind_entries,
    encode_bind_entries, texture_usage,
};
pub use dump::dump;
pub use error::{DecodeError, EncodeError};
pub use expr::{BinaryOp, ExprError, ExprOp, ExprProgram, UnaryOp, Xorshift32, derive_seed};
pub use header::Header;
pub use ids::{BiasedId, DataId, StringId};
pub use instructions::{
    Category, ElementType, IndexFormat, Instruction, LoadOp, Opcode, Operand, OperandKind,
    OperandRole, Operands, StoreOp, usage,
};
pub use module::{Module, ModuleError};
pub use reflection::{
    AnimationTable, EndBehavior, SceneEntry, UniformField, UniformType, WgslEntry,
};

/// Expression sub-VM op bytes and limits.
pub mod expr_ops {
    pub use super::expr::MAX_STACK;
    pub use super::expr::op::*;
}

#[cfg(test)]
mod codec_tests;
#[cfg(test)]
mod descriptors_tests;
#[cfg(test)]
mod expr_tests;
#[cfg(test)]
mod module_tests;
