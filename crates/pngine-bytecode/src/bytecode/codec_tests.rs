//! Tests for the instruction codec.

use super::codec::{decode, encode, encode_all, encoded_len, from_values, instructions, skip};
use super::error::{DecodeError, EncodeError};
use super::instructions::{Instruction, OperandKind, Opcode};

/// Operand values for `opcode` that cover every varint width.
fn sample_values(opcode: Opcode) -> Vec<u32> {
    const WIDE: [u32; 3] = [5, 300, 70_000];
    opcode
        .operands()
        .iter()
        .enumerate()
        .map(|(i, operand)| match operand.kind {
            OperandKind::Varint => WIDE[i % WIDE.len()],
            OperandKind::Byte => 1,
        })
        .collect()
}

#[test]
fn skip_decode_and_encode_agree_for_every_opcode() {
    for &opcode in Opcode::ALL {
        let instr = from_values(opcode, &sample_values(opcode)).unwrap();

        let mut bytes = Vec::new();
        let written = encode(&instr, &mut bytes).unwrap();
        assert_eq!(written, bytes.len(), "{opcode:?}");
        assert_eq!(encoded_len(&instr), written, "{opcode:?}");

        let (decoded, decoded_len) = decode(&bytes, 0).unwrap();
        assert_eq!(decoded, instr, "{opcode:?}");
        assert_eq!(decoded_len, written, "{opcode:?}");

        let (skipped_op, skipped_len) = skip(&bytes, 0).unwrap();
        assert_eq!(skipped_op, opcode);
        assert_eq!(skipped_len, written, "{opcode:?}");
    }
}

#[test]
fn every_truncation_is_eof_not_panic() {
    for &opcode in Opcode::ALL {
        let instr = from_values(opcode, &sample_values(opcode)).unwrap();
        let mut bytes = Vec::new();
        encode(&instr, &mut bytes).unwrap();

        for cut in 1..bytes.len() {
            let err = decode(&bytes[..cut], 0).unwrap_err();
            assert!(
                matches!(err, DecodeError::UnexpectedEof { .. }),
                "{opcode:?} cut at {cut}: {err:?}"
            );
            assert!(skip(&bytes[..cut], 0).is_err());
        }
    }
}

#[test]
fn opcode_bytes_and_mnemonics_are_unique() {
    for (i, a) in Opcode::ALL.iter().enumerate() {
        for b in &Opcode::ALL[i + 1..] {
            assert_ne!(*a as u8, *b as u8);
            assert_ne!(a.mnemonic(), b.mnemonic());
        }
        assert_eq!(Opcode::from_u8(*a as u8), Some(*a));
        assert_eq!(Opcode::from_mnemonic(a.mnemonic()), Some(*a));
    }
}

#[test]
fn decode_named_fields() {
    let bytes = [0x01, 0x00, 0x81, 0x00, 0x60];
    let (instr, len) = decode(&bytes, 0).unwrap();

    assert_eq!(len, 5);
    assert_eq!(
        instr,
        Instruction::CreateBuffer {
            buffer: 0,
            size: 256,
            usage: 0x60,
        }
    );
}

#[test]
fn unknown_opcode_reports_offset() {
    let bytes = [0xF0, 0xF0, 0x99];
    let err = decode(&bytes, 2).unwrap_err();
    assert_eq!(err, DecodeError::UnknownOpcode { offset: 2, byte: 0x99 });
}

#[test]
fn operand_error_offset_is_absolute() {
    // draw with a truncated 2-byte varint as its second operand
    let bytes = [0xF0, 0x16, 0x03, 0x80];
    let err = decode(&bytes, 1).unwrap_err();
    assert_eq!(err.offset(), Some(4));
}

#[test]
fn from_values_checks_shape() {
    assert_eq!(
        from_values(Opcode::Draw, &[3, 1]),
        Err(EncodeError::OperandCount {
            opcode: Opcode::Draw,
            expected: 4,
            got: 2,
        })
    );
    assert_eq!(
        from_values(Opcode::SetBindGroup, &[256, 0]),
        Err(EncodeError::ByteOverflow {
            opcode: Opcode::SetBindGroup,
            operand: "slot",
            value: 256,
        })
    );
    assert_eq!(
        from_values(Opcode::SetPipeline, &[u32::MAX]),
        Err(EncodeError::VarintOverflow(u32::MAX))
    );
}

#[test]
fn failed_encode_leaves_output_untouched() {
    let mut out = vec![0xAA];
    let instr = Instruction::Dispatch {
        x: 1,
        y: u32::MAX,
        z: 1,
    };
    assert!(encode(&instr, &mut out).is_err());
    assert_eq!(out, [0xAA]);
}

#[test]
fn instruction_iterator_yields_offsets() {
    let program = [
        Instruction::BeginComputePass {},
        Instruction::Dispatch { x: 200, y: 1, z: 1 },
        Instruction::EndPass {},
    ];
    let bytes = encode_all(&program).unwrap();

    let decoded: Vec<_> = instructions(&bytes).map(|r| r.unwrap()).collect();
    assert_eq!(
        decoded,
        vec![(0, program[0]), (1, program[1]), (6, program[2])]
    );
}

#[test]
fn instruction_iterator_stops_after_error() {
    let bytes = [0xF0, 0x77, 0xF0];
    let items: Vec<_> = instructions(&bytes).collect();
    assert_eq!(items.len(), 2);
    assert!(items[1].is_err());
}
