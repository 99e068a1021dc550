//! Execution tracing.
//!
//! `NoopTracer` methods are `#[inline(always)]` and empty, so untraced
//! execution pays nothing. `PrintTracer` collects one line per event for
//! `validate -v` style output.

use pngine_bytecode::bytecode::{Instruction, Module, OperandRole, StringId};
use pngine_core::Colors;
use pngine_core::utils::{quote, width_for_count};

use super::error::DispatchError;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Instructions with bare operand values.
    #[default]
    Default,
    /// Operands are labeled with their names; strings are resolved.
    Verbose,
}

/// Instrumentation hooks called by the dispatcher.
///
/// - `trace_instruction` - before executing an instruction
/// - `trace_frame_begin` / `trace_frame_end` - around a frame body
/// - `trace_pass_enter` / `trace_pass_exit` - around an `exec_pass` body
/// - `trace_error` - when a run aborts
pub trait Tracer {
    fn trace_instruction(&mut self, offset: usize, instr: &Instruction);

    fn trace_frame_begin(&mut self, frame: u32, counter: u64);

    fn trace_frame_end(&mut self, frame: u32, counter: u64);

    fn trace_pass_enter(&mut self, pass: u32);

    fn trace_pass_exit(&mut self, pass: u32);

    fn trace_error(&mut self, err: &DispatchError);
}

/// Tracer that compiles away.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_instruction(&mut self, _offset: usize, _instr: &Instruction) {}

    #[inline(always)]
    fn trace_frame_begin(&mut self, _frame: u32, _counter: u64) {}

    #[inline(always)]
    fn trace_frame_end(&mut self, _frame: u32, _counter: u64) {}

    #[inline(always)]
    fn trace_pass_enter(&mut self, _pass: u32) {}

    #[inline(always)]
    fn trace_pass_exit(&mut self, _pass: u32) {}

    #[inline(always)]
    fn trace_error(&mut self, _err: &DispatchError) {}
}

/// Tracer that collects formatted lines.
pub struct PrintTracer {
    lines: Vec<String>,
    strings: Vec<String>,
    verbosity: Verbosity,
    offset_width: usize,
    depth: usize,
    colors: Colors,
}

impl PrintTracer {
    pub fn new(module: &Module, verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            lines: Vec::new(),
            strings: module.strings().to_vec(),
            verbosity,
            offset_width: width_for_count(module.bytecode().len()).max(4),
            depth: 0,
            colors,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }

    fn string(&self, id: u32) -> Option<&str> {
        self.strings
            .get(StringId(id).index())
            .map(String::as_str)
    }
}

impl Tracer for PrintTracer {
    fn trace_instruction(&mut self, offset: usize, instr: &Instruction) {
        let c = self.colors;
        let opcode = instr.opcode();
        let mut line = format!(
            "{}{:0w$}{}  {}{}{}{}",
            c.offset,
            offset,
            c.reset,
            self.indent(),
            c.op,
            opcode.mnemonic(),
            c.reset,
            w = self.offset_width
        );

        let values = instr.operand_values();
        for (operand, &value) in opcode.operands().iter().zip(values.as_slice()) {
            line.push(' ');
            if self.verbosity == Verbosity::Verbose {
                line.push_str(&format!("{}{}={}", c.meta, operand.name, c.reset));
            }
            match (operand.role, self.string(value)) {
                (OperandRole::String, Some(s)) if self.verbosity == Verbosity::Verbose => {
                    line.push_str(&format!("{}{}{}", c.literal, quote(s), c.reset));
                }
                _ => line.push_str(&value.to_string()),
            }
        }
        self.lines.push(line);
    }

    fn trace_frame_begin(&mut self, frame: u32, counter: u64) {
        let c = self.colors;
        self.lines.push(format!(
            "{}-- frame {frame} (counter {counter}){}",
            c.meta, c.reset
        ));
        self.depth += 1;
    }

    fn trace_frame_end(&mut self, frame: u32, counter: u64) {
        let c = self.colors;
        self.depth = self.depth.saturating_sub(1);
        self.lines.push(format!(
            "{}-- end frame {frame} (counter {counter}){}",
            c.meta, c.reset
        ));
    }

    fn trace_pass_enter(&mut self, pass: u32) {
        let c = self.colors;
        self.lines
            .push(format!("{}{}-> pass {pass}{}", self.indent(), c.meta, c.reset));
        self.depth += 1;
    }

    fn trace_pass_exit(&mut self, pass: u32) {
        let c = self.colors;
        self.depth = self.depth.saturating_sub(1);
        self.lines
            .push(format!("{}{}<- pass {pass}{}", self.indent(), c.meta, c.reset));
    }

    fn trace_error(&mut self, err: &DispatchError) {
        let c = self.colors;
        self.depth = 0;
        self.lines.push(format!("{} {err}", c.paint(c.error, "error:")));
    }
}
