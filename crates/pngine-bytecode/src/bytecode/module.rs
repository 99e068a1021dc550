//! Module loading and serialization.
//!
//! A [`Module`] is fully owned and fully validated: the header, checksum,
//! section bounds, section contents and reflection-table cross references are
//! all checked at load. Bytecode operands are checked when dispatched.

use std::io;
use std::path::Path;

use super::capabilities::Capabilities;
use super::constants::{VERSION, flags, header_len};
use super::error::{DecodeError, EncodeError};
use super::header::Header;
use super::ids::{DataId, StringId};
use super::reflection::{AnimationTable, UniformField, WgslEntry};
use super::sections;

/// Module load or save error.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("file too small: {0} bytes")]
    FileTooSmall(usize),
    #[error("invalid magic: expected PNGB")]
    InvalidMagic,
    #[error("unsupported version: {0} (expected 1..={VERSION})")]
    UnsupportedVersion(u16),
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("checksum mismatch: header has {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("{section} section out of bounds (offset {offset})")]
    SectionOutOfBounds { section: &'static str, offset: u32 },
    #[error("header flags {declared:#06x} do not match present sections {expected:#06x}")]
    FlagsMismatch { declared: u16, expected: u16 },
    #[error("invalid {section} section: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: DecodeError,
    },
    #[error("{what} refers to {kind} {id}, but only {count} exist")]
    DanglingReference {
        what: &'static str,
        kind: &'static str,
        id: u32,
        count: usize,
    },
    #[error("invalid animation table: {0}")]
    InvalidAnimation(&'static str),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A loaded bytecode module.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub(crate) version: u16,
    pub(crate) capabilities: Capabilities,
    pub(crate) strings: Vec<String>,
    pub(crate) data: Vec<Vec<u8>>,
    pub(crate) wgsl: Vec<WgslEntry>,
    pub(crate) uniforms: Vec<UniformField>,
    pub(crate) animation: Option<AnimationTable>,
    pub(crate) bytecode: Vec<u8>,
    pub(crate) interpreter: Vec<u8>,
}

impl Default for Module {
    fn default() -> Self {
        Self {
            version: VERSION,
            capabilities: Capabilities::empty(),
            strings: Vec::new(),
            data: Vec::new(),
            wgsl: Vec::new(),
            uniforms: Vec::new(),
            animation: None,
            bytecode: Vec::new(),
            interpreter: Vec::new(),
        }
    }
}

/// Section order on disk. Each present section ends where the next begins.
const SECTION_NAMES: [&str; 7] = [
    "strings",
    "data",
    "wgsl",
    "uniforms",
    "animation",
    "bytecode",
    "interpreter",
];

impl Module {
    /// Load a module from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModuleError> {
        Self::deserialize(bytes)
    }

    /// Load a module from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let bytes = std::fs::read(path)?;
        Self::deserialize(&bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, ModuleError> {
        let header = Header::parse(bytes)?;
        let hlen = header.byte_len();

        if header.total_size as usize != bytes.len() {
            return Err(ModuleError::SizeMismatch {
                header: header.total_size,
                actual: bytes.len(),
            });
        }

        let actual = crc32fast::hash(&bytes[hlen..]);
        if actual != header.checksum {
            return Err(ModuleError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        let ranges = section_ranges(&header, bytes.len())?;
        let expected_flags = presence_flags(&ranges);
        if header.flags != expected_flags {
            return Err(ModuleError::FlagsMismatch {
                declared: header.flags,
                expected: expected_flags,
            });
        }

        let section = |i: usize| ranges[i].map(|(start, end)| &bytes[start..end]);
        let invalid = |section: &'static str| {
            move |source: DecodeError| ModuleError::InvalidSection { section, source }
        };

        let strings = sections::decode_strings(section(0).unwrap_or_default())
            .map_err(invalid("strings"))?;
        let data =
            sections::decode_data(section(1).unwrap_or_default()).map_err(invalid("data"))?;
        let wgsl = match section(2) {
            Some(b) => sections::decode_wgsl(b).map_err(invalid("wgsl"))?,
            None => Vec::new(),
        };
        let uniforms = match section(3) {
            Some(b) => sections::decode_uniforms(b).map_err(invalid("uniforms"))?,
            None => Vec::new(),
        };
        let animation = match section(4) {
            Some(b) => Some(sections::decode_animation(b).map_err(invalid("animation"))?),
            None => None,
        };
        let bytecode = section(5).unwrap_or_default().to_vec();
        let interpreter = section(6).unwrap_or_default().to_vec();

        // Older formats carry no capability word; derive it.
        let capabilities = if header.version >= 3 {
            Capabilities(header.capabilities)
        } else {
            Capabilities::scan(&bytecode).unwrap_or_default()
        };

        let module = Self {
            version: header.version,
            capabilities,
            strings,
            data,
            wgsl,
            uniforms,
            animation,
            bytecode,
            interpreter,
        };
        module.validate_references()?;
        Ok(module)
    }

    pub(crate) fn validate_references(&self) -> Result<(), ModuleError> {
        let check_string = |what: &'static str, id: StringId| {
            if id.index() < self.strings.len() {
                Ok(())
            } else {
                Err(ModuleError::DanglingReference {
                    what,
                    kind: "string",
                    id: id.get(),
                    count: self.strings.len(),
                })
            }
        };

        for entry in &self.wgsl {
            check_string("wgsl entry", entry.name)?;
            if entry.data.index() >= self.data.len() {
                return Err(ModuleError::DanglingReference {
                    what: "wgsl entry",
                    kind: "data entry",
                    id: entry.data.get(),
                    count: self.data.len(),
                });
            }
        }
        for field in &self.uniforms {
            check_string("uniform field", field.name)?;
        }
        if let Some(animation) = &self.animation {
            for scene in &animation.scenes {
                check_string("scene", scene.name)?;
                check_string("scene", scene.frame)?;
            }
            animation.validate().map_err(ModuleError::InvalidAnimation)?;
        }
        Ok(())
    }

    /// Serialize into the current format version.
    pub fn serialize(&self) -> Result<Vec<u8>, ModuleError> {
        let mut parts: [Option<Vec<u8>>; 7] = Default::default();

        let mut buf = Vec::new();
        sections::encode_strings(&self.strings, &mut buf)?;
        parts[0] = Some(buf);

        let mut buf = Vec::new();
        sections::encode_data(&self.data, &mut buf)?;
        parts[1] = Some(buf);

        if !self.wgsl.is_empty() {
            let mut buf = Vec::new();
            sections::encode_wgsl(&self.wgsl, &mut buf)?;
            parts[2] = Some(buf);
        }
        if !self.uniforms.is_empty() {
            let mut buf = Vec::new();
            sections::encode_uniforms(&self.uniforms, &mut buf)?;
            parts[3] = Some(buf);
        }
        if let Some(animation) = &self.animation {
            let mut buf = Vec::new();
            sections::encode_animation(animation, &mut buf)?;
            parts[4] = Some(buf);
        }
        parts[5] = Some(self.bytecode.clone());
        if !self.interpreter.is_empty() {
            parts[6] = Some(self.interpreter.clone());
        }

        let hlen = header_len(VERSION).unwrap_or(52);
        let mut offsets = [0u32; 7];
        let mut body = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if let Some(bytes) = part {
                offsets[i] = to_u32("module size", hlen + body.len())?;
                body.extend_from_slice(bytes);
            }
        }

        let mut header = Header {
            version: VERSION,
            flags: self.flags(),
            total_size: to_u32("module size", hlen + body.len())?,
            checksum: crc32fast::hash(&body),
            strings_offset: offsets[0],
            data_offset: offsets[1],
            wgsl_offset: offsets[2],
            uniforms_offset: offsets[3],
            animation_offset: offsets[4],
            bytecode_offset: offsets[5],
            capabilities: self.capabilities.bits(),
            ..Header::default()
        };
        if !self.interpreter.is_empty() {
            header.interpreter_offset = offsets[6];
            header.interpreter_len = to_u32("interpreter size", self.interpreter.len())?;
        }

        let mut out = Vec::with_capacity(hlen + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Header flags implied by the module contents.
    pub fn flags(&self) -> u16 {
        let mut bits = 0;
        if !self.interpreter.is_empty() {
            bits |= flags::HAS_INTERPRETER;
        }
        if !self.uniforms.is_empty() {
            bits |= flags::HAS_UNIFORMS;
        }
        if self.animation.is_some() {
            bits |= flags::HAS_ANIMATION;
        }
        if !self.wgsl.is_empty() {
            bits |= flags::HAS_WGSL;
        }
        bits
    }

    /// Declared capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn string(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.index()).map(String::as_str)
    }

    pub fn find_string(&self, s: &str) -> Option<StringId> {
        self.strings
            .iter()
            .position(|x| x == s)
            .map(|i| StringId(i as u32))
    }

    pub fn data(&self) -> &[Vec<u8>] {
        &self.data
    }

    pub fn data_entry(&self, id: DataId) -> Option<&[u8]> {
        self.data.get(id.index()).map(Vec::as_slice)
    }

    pub fn wgsl(&self) -> &[WgslEntry] {
        &self.wgsl
    }

    pub fn uniforms(&self) -> &[UniformField] {
        &self.uniforms
    }

    pub fn animation(&self) -> Option<&AnimationTable> {
        self.animation.as_ref()
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Embedded interpreter blob, if any.
    pub fn interpreter(&self) -> Option<&[u8]> {
        (!self.interpreter.is_empty()).then_some(self.interpreter.as_slice())
    }

    pub fn set_interpreter(&mut self, blob: Vec<u8>) {
        self.interpreter = blob;
    }
}

fn to_u32(what: &'static str, n: usize) -> Result<u32, EncodeError> {
    u32::try_from(n).map_err(|_| EncodeError::TooMany { what, count: n })
}

type Ranges = [Option<(usize, usize)>; 7];

/// Compute `[start, end)` for each present section, in [`SECTION_NAMES`] order.
fn section_ranges(header: &Header, total: usize) -> Result<Ranges, ModuleError> {
    let hlen = header.byte_len();
    let has_interp = header.version >= 2 && header.interpreter_len != 0;
    let optional = |offset: u32| (offset != 0).then_some(offset);

    let starts: [Option<u32>; 7] = [
        Some(header.strings_offset),
        Some(header.data_offset),
        optional(header.wgsl_offset),
        optional(header.uniforms_offset),
        optional(header.animation_offset),
        Some(header.bytecode_offset),
        has_interp.then_some(header.interpreter_offset),
    ];

    let mut prev = hlen;
    for (i, start) in starts.iter().enumerate() {
        let Some(start) = *start else { continue };
        let s = start as usize;
        if s < prev || s > total {
            return Err(ModuleError::SectionOutOfBounds {
                section: SECTION_NAMES[i],
                offset: start,
            });
        }
        prev = s;
    }

    if has_interp {
        let end = header.interpreter_offset as u64 + header.interpreter_len as u64;
        if end != total as u64 {
            return Err(ModuleError::SectionOutOfBounds {
                section: "interpreter",
                offset: header.interpreter_offset,
            });
        }
    }

    let mut ranges: Ranges = [None; 7];
    for i in 0..starts.len() {
        let Some(start) = starts[i] else { continue };
        let end = starts[i + 1..]
            .iter()
            .flatten()
            .next()
            .map_or(total, |&next| next as usize);
        ranges[i] = Some((start as usize, end));
    }
    Ok(ranges)
}

fn presence_flags(ranges: &Ranges) -> u16 {
    let mut bits = 0;
    if ranges[2].is_some() {
        bits |= flags::HAS_WGSL;
    }
    if ranges[3].is_some() {
        bits |= flags::HAS_UNIFORMS;
    }
    if ranges[4].is_some() {
        bits |= flags::HAS_ANIMATION;
    }
    if ranges[6].is_some() {
        bits |= flags::HAS_INTERPRETER;
    }
    bits
}
