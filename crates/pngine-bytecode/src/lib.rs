#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Bytecode format for PNGine.
//!
//! This crate contains:
//! - The instruction set and its varint wire encoding
//! - The module container (header, sections, reflection tables)
//! - Resource descriptors and the procedural-data expression language
//! - A module builder, an assembler and a disassembler

pub mod bytecode;

// Re-export commonly used items at crate root
pub use bytecode::{
    AnimationTable, AsmError, Assembler, BiasedId, Capabilities, DataId, DecodeError,
    EncodeError, EndBehavior, Header, Instruction, Module, ModuleBuilder, ModuleError, Opcode,
    SceneEntry, StringId, UniformField, UniformType, VERSION, assemble, dump,
};
