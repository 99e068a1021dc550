//! Human-readable module listing.
//!
//! With colors off the output is a valid assembly listing: assembling it
//! yields the same tables and byte-identical bytecode.

use std::fmt::Write as _;

use pngine_core::Colors;
use pngine_core::utils::{quote, to_hex, width_for_count};

use super::codec;
use super::instructions::{Opcode, OperandRole};
use super::module::Module;

/// Generate a listing of `module`.
pub fn dump(module: &Module, colors: Colors) -> String {
    let mut out = String::new();
    let c = &colors;

    writeln!(
        out,
        "{}; pngine module v{}, capabilities: {}{}",
        c.meta,
        module.version(),
        module.capabilities(),
        c.reset
    )
    .ok();

    dump_tables(&mut out, module, c);
    dump_code(&mut out, module, c);
    out
}

fn string_label(id: u32) -> String {
    format!("@s{id}")
}

fn dump_tables(out: &mut String, module: &Module, c: &Colors) {
    for (i, s) in module.strings().iter().enumerate() {
        writeln!(out, "{}.string{} s{i} {}{}{}", c.op, c.reset, c.literal, quote(s), c.reset)
            .ok();
    }
    for (i, d) in module.data().iter().enumerate() {
        writeln!(out, "{}.data{} d{i} hex:{}", c.op, c.reset, to_hex(d)).ok();
    }
    for e in module.wgsl() {
        writeln!(
            out,
            "{}.wgsl{} {} $d{}",
            c.op,
            c.reset,
            string_label(e.name.get()),
            e.data.get()
        )
        .ok();
    }
    for f in module.uniforms() {
        writeln!(
            out,
            "{}.uniform{} {} {} {} {}",
            c.op,
            c.reset,
            string_label(f.name.get()),
            f.buffer,
            f.offset,
            f.ty.name()
        )
        .ok();
    }
    if let Some(anim) = module.animation() {
        writeln!(
            out,
            "{}.animation{} {:?} {} {}",
            c.op,
            c.reset,
            anim.duration,
            anim.looping,
            anim.end_behavior.name()
        )
        .ok();
        for s in &anim.scenes {
            writeln!(
                out,
                "{}.scene{} {} {} {:?} {:?}",
                c.op,
                c.reset,
                string_label(s.name.get()),
                string_label(s.frame.get()),
                s.start,
                s.end
            )
            .ok();
        }
    }
}

fn dump_code(out: &mut String, module: &Module, c: &Colors) {
    let bytecode = module.bytecode();
    if bytecode.is_empty() {
        return;
    }
    out.push('\n');

    let width = width_for_count(bytecode.len()).max(4);
    let mut depth = 0usize;

    for item in codec::instructions(bytecode) {
        let (offset, instr) = match item {
            Ok(pair) => pair,
            Err(e) => {
                writeln!(out, "{}; error: {e}{}", c.meta, c.reset).ok();
                return;
            }
        };
        let opcode = instr.opcode();
        if matches!(opcode, Opcode::EndFrame | Opcode::EndPassDef) {
            depth = depth.saturating_sub(1);
        }

        let mut line = String::new();
        for _ in 0..depth {
            line.push_str("  ");
        }
        write!(line, "{}{}{}", c.op, opcode.mnemonic(), c.reset).ok();

        let values = instr.operand_values();
        for (operand, &value) in opcode.operands().iter().zip(values.as_slice()) {
            line.push(' ');
            match operand.role {
                OperandRole::String if (value as usize) < module.strings().len() => {
                    write!(line, "{}{}{}", c.literal, string_label(value), c.reset).ok();
                }
                OperandRole::Data if (value as usize) < module.data().len() => {
                    write!(line, "{}$d{value}{}", c.literal, c.reset).ok();
                }
                _ => {
                    write!(line, "{value}").ok();
                }
            }
        }

        writeln!(
            out,
            "{line:<40} {}; {}{offset:0width$}{}",
            c.meta, c.offset, c.reset
        )
        .ok();

        if matches!(opcode, Opcode::DefineFrame | Opcode::DefinePass) {
            depth += 1;
        }
    }
}
