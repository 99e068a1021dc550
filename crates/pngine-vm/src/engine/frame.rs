//! Frame and pass-definition index.
//!
//! Built by one linear scan of the bytecode. The scan is also where frame
//! structure is checked: frames do not nest, pass definitions live at the
//! top level, and pass bodies contain neither frames, definitions nor
//! `exec_pass`.
//!
//! The first undecodable byte or structural violation stops the scan. It is
//! kept as the index's fault rather than failing the whole build: regions
//! closed before it stay usable, and the region open at that point is kept
//! as a truncated span that fails once execution reaches the fault.

use pngine_bytecode::bytecode::{Instruction, Module, Opcode, StringId, decode_instruction};

use super::error::{DispatchError, RuntimeError};

/// Byte layout of a `define_frame` .. `end_frame` region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSpan {
    pub id: u32,
    pub name: StringId,
    /// Offset of `define_frame`.
    pub start: usize,
    /// First byte of the body.
    pub body_start: usize,
    /// Offset of `end_frame`, or of the fault for a truncated span.
    pub body_end: usize,
    /// First byte after `end_frame`.
    pub end: usize,
    /// The region runs into the index fault and has no terminator.
    pub truncated: bool,
}

/// Byte layout of a `define_pass` .. `end_pass_def` region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSpan {
    pub id: u32,
    pub start: usize,
    pub body_start: usize,
    pub body_end: usize,
    pub end: usize,
    pub truncated: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameIndex {
    frames: Vec<FrameSpan>,
    passes: Vec<PassSpan>,
    fault: Option<DispatchError>,
}

#[derive(Clone, Copy)]
enum Open {
    Frame(u32, StringId, usize, usize),
    Pass(u32, usize, usize),
}

fn structure(offset: usize, opcode: Opcode, reason: &'static str) -> DispatchError {
    DispatchError::new(offset, Some(opcode), RuntimeError::Structure(reason))
}

impl FrameIndex {
    pub fn build(module: &Module) -> Self {
        let mut index = Self::default();
        let mut open = None;
        if let Err(fault) = index.scan(module, &mut open) {
            index.truncate(open, &fault);
            index.fault = Some(fault);
        }
        index
    }

    fn scan(&mut self, module: &Module, open: &mut Option<Open>) -> Result<(), DispatchError> {
        let bytecode = module.bytecode();
        let mut offset = 0;

        while offset < bytecode.len() {
            let (instr, len) = decode_instruction(bytecode, offset)
                .map_err(|e| DispatchError::new(offset, Opcode::from_u8(bytecode[offset]), e))?;
            let opcode = instr.opcode();
            let next = offset + len;

            match instr {
                Instruction::DefineFrame { frame, name } => {
                    match open {
                        Some(Open::Frame(..)) => return Err(structure(offset, opcode, "nested frame")),
                        Some(Open::Pass(..)) => {
                            return Err(structure(offset, opcode, "frame inside pass definition"));
                        }
                        None => {}
                    }
                    if module.string(StringId(name)).is_none() {
                        return Err(DispatchError::new(
                            offset,
                            Some(opcode),
                            RuntimeError::MissingString(name),
                        ));
                    }
                    if self.frame_by_id(frame).is_some() {
                        return Err(structure(offset, opcode, "duplicate frame id"));
                    }
                    *open = Some(Open::Frame(frame, StringId(name), offset, next));
                }
                Instruction::EndFrame {} => {
                    let Some(Open::Frame(id, name, start, body_start)) = *open else {
                        return Err(structure(offset, opcode, "end_frame without define_frame"));
                    };
                    self.frames.push(FrameSpan {
                        id,
                        name,
                        start,
                        body_start,
                        body_end: offset,
                        end: next,
                        truncated: false,
                    });
                    *open = None;
                }
                Instruction::DefinePass { pass } => {
                    match open {
                        Some(Open::Frame(..)) => {
                            return Err(structure(offset, opcode, "pass definition inside frame"));
                        }
                        Some(Open::Pass(..)) => {
                            return Err(structure(offset, opcode, "nested pass definition"));
                        }
                        None => {}
                    }
                    if self.pass(pass).is_some() {
                        return Err(structure(offset, opcode, "duplicate pass id"));
                    }
                    *open = Some(Open::Pass(pass, offset, next));
                }
                Instruction::EndPassDef {} => {
                    let Some(Open::Pass(id, start, body_start)) = *open else {
                        return Err(structure(offset, opcode, "end_pass_def without define_pass"));
                    };
                    self.passes.push(PassSpan {
                        id,
                        start,
                        body_start,
                        body_end: offset,
                        end: next,
                        truncated: false,
                    });
                    *open = None;
                }
                Instruction::ExecPass { .. } if matches!(open, Some(Open::Pass(..))) => {
                    return Err(structure(offset, opcode, "exec_pass inside pass definition"));
                }
                _ => {}
            }
            offset = next;
        }

        match *open {
            Some(Open::Frame(_, _, start, _)) => {
                Err(structure(start, Opcode::DefineFrame, "unterminated frame"))
            }
            Some(Open::Pass(_, start, _)) => {
                Err(structure(start, Opcode::DefinePass, "unterminated pass definition"))
            }
            None => Ok(()),
        }
    }

    /// Keep the region open at the fault, cut at the fault offset.
    fn truncate(&mut self, open: Option<Open>, fault: &DispatchError) {
        match open {
            Some(Open::Frame(id, name, start, body_start)) => {
                let body_end = fault.offset.max(body_start);
                self.frames.push(FrameSpan {
                    id,
                    name,
                    start,
                    body_start,
                    body_end,
                    end: body_end,
                    truncated: true,
                });
            }
            Some(Open::Pass(id, start, body_start)) => {
                let body_end = fault.offset.max(body_start);
                self.passes.push(PassSpan {
                    id,
                    start,
                    body_start,
                    body_end,
                    end: body_end,
                    truncated: true,
                });
            }
            None => {}
        }
    }

    /// First decode or structure error found by the scan, if any.
    pub fn fault(&self) -> Option<&DispatchError> {
        self.fault.as_ref()
    }

    pub fn frames(&self) -> &[FrameSpan] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<FrameSpan> {
        self.frames.get(index).copied()
    }

    pub fn frame_by_id(&self, id: u32) -> Option<usize> {
        self.frames.iter().position(|f| f.id == id)
    }

    pub fn frame_by_name(&self, module: &Module, name: &str) -> Option<usize> {
        self.frames
            .iter()
            .position(|f| module.string(f.name) == Some(name))
    }

    /// Frame whose `define_frame` sits at `offset`.
    pub fn frame_at(&self, offset: usize) -> Option<FrameSpan> {
        self.frames.iter().find(|f| f.start == offset).copied()
    }

    pub fn pass(&self, id: u32) -> Option<PassSpan> {
        self.passes.iter().find(|p| p.id == id).copied()
    }

    /// Pass definition starting at `offset`.
    pub fn pass_at(&self, offset: usize) -> Option<PassSpan> {
        self.passes.iter().find(|p| p.start == offset).copied()
    }

    pub fn passes(&self) -> &[PassSpan] {
        &self.passes
    }
}
