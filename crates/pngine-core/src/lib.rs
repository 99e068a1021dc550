#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared helpers for the PNGine toolchain.
//!
//! Terminal colors and small formatting utilities used by the bytecode
//! disassembler, execution traces and the CLI.

mod colors;
pub mod utils;

#[cfg(test)]
mod utils_tests;

pub use colors::Colors;
