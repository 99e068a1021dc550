//! Tests for module serialization and load-time validation.

use super::builder::ModuleBuilder;
use super::capabilities::Capabilities;
use super::constants::{MAGIC, flags};
use super::header::Header;
use super::ids::StringId;
use super::instructions::Instruction;
use super::module::{Module, ModuleError};
use super::reflection::{EndBehavior, UniformField, UniformType};

fn sample_module() -> Module {
    let mut b = ModuleBuilder::new();
    let shader = b.add_wgsl("tri", "@vertex fn vs() {}");
    let main = b.intern("main");
    b.add_uniform("time", 0, 0, UniformType::F32);
    b.add_uniform("color", 0, 16, UniformType::Vec4F);
    b.set_animation(4.0, true, EndBehavior::Hold);
    b.add_scene("intro", "main", 0.0, 4.0);
    b.set_interpreter(vec![0, 97, 115, 109]);
    b.emit_all([
        Instruction::CreateBuffer {
            buffer: 0,
            size: 32,
            usage: 0x48,
        },
        Instruction::CreateShaderModule {
            shader: 0,
            code: shader.get(),
        },
        Instruction::DefineFrame {
            frame: 0,
            name: main.get(),
        },
        Instruction::WriteTimeUniform {
            buffer: 0,
            offset: 0,
            size: 16,
        },
        Instruction::Submit {},
        Instruction::EndFrame {},
    ])
    .unwrap();
    b.finish().unwrap()
}

#[test]
fn round_trip() {
    let module = sample_module();
    let bytes = module.serialize().unwrap();
    let loaded = Module::deserialize(&bytes).unwrap();
    assert_eq!(loaded, module);
    assert_eq!(loaded.serialize().unwrap(), bytes);
}

#[test]
fn empty_module_round_trip() {
    let module = ModuleBuilder::new().finish().unwrap();
    let bytes = module.serialize().unwrap();
    assert_eq!(bytes.len(), 52 + 8);
    assert_eq!(Module::deserialize(&bytes).unwrap(), module);
}

#[test]
fn header_describes_sections() {
    let module = sample_module();
    let bytes = module.serialize().unwrap();
    let header = Header::parse(&bytes).unwrap();

    assert_eq!(header.version, 3);
    assert_eq!(header.total_size as usize, bytes.len());
    assert_eq!(
        header.flags,
        flags::HAS_INTERPRETER | flags::HAS_UNIFORMS | flags::HAS_ANIMATION | flags::HAS_WGSL
    );
    assert_eq!(header.strings_offset, 52);
    assert!(header.data_offset < header.wgsl_offset);
    assert!(header.uniforms_offset < header.animation_offset);
    assert!(header.animation_offset < header.bytecode_offset);
    assert_eq!(
        header.interpreter_offset + header.interpreter_len,
        header.total_size
    );
    assert_eq!(crc32fast::hash(&bytes[52..]), header.checksum);
}

#[test]
fn capabilities_derived_from_bytecode_and_tables() {
    let caps = sample_module().capabilities();
    assert!(caps.contains(Capabilities::TIME_UNIFORM));
    assert!(caps.contains(Capabilities::ANIMATION));
    assert!(!caps.contains(Capabilities::COMPUTE));
    assert_eq!(caps.to_string(), "animation,time-uniform");
}

#[test]
fn accessors() {
    let module = sample_module();
    assert_eq!(module.find_string("main"), Some(StringId(1)));
    assert_eq!(module.string(StringId(0)), Some("tri"));
    assert_eq!(module.uniforms().len(), 2);
    assert_eq!(module.uniforms()[1].size, 16);
    assert_eq!(module.interpreter(), Some(&[0, 97, 115, 109][..]));
    assert_eq!(module.wgsl().len(), 1);
}

#[test]
fn every_truncation_is_rejected() {
    let bytes = sample_module().serialize().unwrap();
    for cut in 0..bytes.len() {
        let err = Module::deserialize(&bytes[..cut]).unwrap_err();
        assert!(
            matches!(
                err,
                ModuleError::FileTooSmall(_) | ModuleError::SizeMismatch { .. }
            ),
            "cut at {cut}: {err}"
        );
    }
}

#[test]
fn magic_checked_before_version() {
    let mut bytes = sample_module().serialize().unwrap();
    bytes[4] = 9;
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::UnsupportedVersion(9))
    ));

    bytes[0] = b'X';
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::InvalidMagic)
    ));
}

#[test]
fn checksum_mismatch() {
    let mut bytes = sample_module().serialize().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::ChecksumMismatch { .. })
    ));
}

#[test]
fn trailing_byte_is_size_mismatch() {
    let mut bytes = sample_module().serialize().unwrap();
    bytes.push(0);
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::SizeMismatch { .. })
    ));
}

#[test]
fn header_flags_must_match_sections() {
    let mut bytes = sample_module().serialize().unwrap();
    bytes[6] &= !(flags::HAS_WGSL as u8);
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::FlagsMismatch { .. })
    ));
}

#[test]
fn out_of_order_offsets_rejected() {
    let mut bytes = sample_module().serialize().unwrap();
    // data offset before the strings offset
    bytes[20..24].copy_from_slice(&40u32.to_le_bytes());
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::SectionOutOfBounds {
            section: "data",
            ..
        })
    ));
}

#[test]
fn dangling_uniform_name_rejected() {
    let module = Module {
        uniforms: vec![UniformField {
            name: StringId(3),
            buffer: 0,
            offset: 0,
            size: 4,
            ty: UniformType::F32,
        }],
        ..Module::default()
    };
    let bytes = module.serialize().unwrap();
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(ModuleError::DanglingReference {
            what: "uniform field",
            id: 3,
            ..
        })
    ));
}

#[test]
fn overlapping_scenes_rejected() {
    let mut b = ModuleBuilder::new();
    b.add_scene("a", "f", 0.0, 2.0);
    b.add_scene("b", "f", 1.0, 3.0);
    assert!(matches!(b.finish(), Err(ModuleError::InvalidAnimation(_))));
}

#[test]
fn reads_version_1() {
    // strings (count 0), data (count 0), bytecode `nop`
    let body: Vec<u8> = [0u32.to_le_bytes(), 0u32.to_le_bytes()]
        .concat()
        .into_iter()
        .chain([0xF0])
        .collect();
    let total = 28 + body.len() as u32;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&total.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    bytes.extend_from_slice(&28u32.to_le_bytes());
    bytes.extend_from_slice(&32u32.to_le_bytes());
    bytes.extend_from_slice(&36u32.to_le_bytes());
    bytes.extend_from_slice(&body);

    let module = Module::deserialize(&bytes).unwrap();
    assert_eq!(module.version(), 1);
    assert_eq!(module.bytecode(), [0xF0]);
    assert!(module.interpreter().is_none());
    assert!(module.capabilities().is_empty());
}
