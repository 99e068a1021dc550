//! Instruction encoder, decoder and skip scanner.
//!
//! All three walk [`Opcode::operands`]; none of them hard-codes a shape.

use super::error::{DecodeError, EncodeError};
use super::instructions::{Instruction, OperandKind, Operands, Opcode};
use super::varint;
use super::constants::VARINT_MAX;

/// Read the opcode byte at `offset`.
#[inline]
fn read_opcode(bytes: &[u8], offset: usize) -> Result<Opcode, DecodeError> {
    let Some(&byte) = bytes.get(offset) else {
        return Err(DecodeError::UnexpectedEof { offset });
    };
    Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode { offset, byte })
}

/// Decode the instruction starting at `bytes[offset]`.
///
/// Returns the instruction and its encoded length. Error offsets are
/// relative to `bytes`.
pub fn decode(bytes: &[u8], offset: usize) -> Result<(Instruction, usize), DecodeError> {
    let opcode = read_opcode(bytes, offset)?;
    let mut pos = offset + 1;
    let mut ops = Operands::default();

    for operand in opcode.operands() {
        match operand.kind {
            OperandKind::Varint => {
                let rest = bytes.get(pos..).unwrap_or_default();
                let (value, len) = varint::decode(rest).map_err(|e| e.offset_by(pos))?;
                ops.push(value);
                pos += len;
            }
            OperandKind::Byte => {
                let Some(&b) = bytes.get(pos) else {
                    return Err(DecodeError::UnexpectedEof { offset: pos });
                };
                ops.push(b as u32);
                pos += 1;
            }
        }
    }

    Ok((Instruction::from_checked_operands(opcode, &ops), pos - offset))
}

/// Advance past the instruction at `bytes[offset]` without decoding operand
/// values. Returns the opcode and the encoded length.
///
/// Used by frame-range discovery, which only cares about markers.
pub fn skip(bytes: &[u8], offset: usize) -> Result<(Opcode, usize), DecodeError> {
    let opcode = read_opcode(bytes, offset)?;
    let mut pos = offset + 1;

    for operand in opcode.operands() {
        let len = match operand.kind {
            OperandKind::Varint => {
                let rest = bytes.get(pos..).unwrap_or_default();
                varint::peek_len(rest).map_err(|e| e.offset_by(pos))?
            }
            OperandKind::Byte => {
                if pos >= bytes.len() {
                    return Err(DecodeError::UnexpectedEof { offset: pos });
                }
                1
            }
        };
        pos += len;
    }

    Ok((opcode, pos - offset))
}

/// Append the encoding of `instr` to `out`, returning the bytes written.
pub fn encode(instr: &Instruction, out: &mut Vec<u8>) -> Result<usize, EncodeError> {
    let opcode = instr.opcode();
    let values = instr.operand_values();
    let start = out.len();

    out.push(opcode as u8);
    for (operand, &value) in opcode.operands().iter().zip(values.as_slice()) {
        match operand.kind {
            OperandKind::Varint => {
                if let Err(e) = varint::encode(value, out) {
                    out.truncate(start);
                    return Err(e);
                }
            }
            OperandKind::Byte => out.push(value as u8),
        }
    }

    Ok(out.len() - start)
}

/// Encoded length of `instr`.
pub fn encoded_len(instr: &Instruction) -> usize {
    let opcode = instr.opcode();
    let values = instr.operand_values();
    1 + opcode
        .operands()
        .iter()
        .zip(values.as_slice())
        .map(|(operand, &value)| match operand.kind {
            OperandKind::Varint => varint::encoded_len(value),
            OperandKind::Byte => 1,
        })
        .sum::<usize>()
}

/// Build an instruction from raw operand values, checking count and ranges
/// against the opcode's shape.
pub fn from_values(opcode: Opcode, values: &[u32]) -> Result<Instruction, EncodeError> {
    let shape = opcode.operands();
    if values.len() != shape.len() {
        return Err(EncodeError::OperandCount {
            opcode,
            expected: shape.len(),
            got: values.len(),
        });
    }

    for (operand, &value) in shape.iter().zip(values) {
        match operand.kind {
            OperandKind::Varint if value > VARINT_MAX => {
                return Err(EncodeError::VarintOverflow(value));
            }
            OperandKind::Byte if value > u8::MAX as u32 => {
                return Err(EncodeError::ByteOverflow {
                    opcode,
                    operand: operand.name,
                    value,
                });
            }
            _ => {}
        }
    }

    Ok(Instruction::from_checked_operands(
        opcode,
        &Operands::from_slice(values),
    ))
}

/// Iterator over `(offset, instruction)` pairs of a bytecode stream.
///
/// Stops after the first decode error, which it yields.
pub struct Instructions<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }
}

impl Iterator for Instructions<'_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        match decode(self.bytes, self.pos) {
            Ok((instr, len)) => {
                let at = self.pos;
                self.pos += len;
                Some(Ok((at, instr)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterate over the instructions of a bytecode stream.
pub fn instructions(bytes: &[u8]) -> Instructions<'_> {
    Instructions::new(bytes)
}

/// Encode a sequence of instructions into a fresh bytecode vector.
pub fn encode_all<'i>(
    instrs: impl IntoIterator<Item = &'i Instruction>,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for instr in instrs {
        encode(instr, &mut out)?;
    }
    Ok(out)
}
