//! PNG chunk access and module embedding.
//!
//! A PNG is an 8-byte signature followed by chunks framed as
//! `length (u32 BE) | type | data | crc32(type ++ data) (u32 BE)`.
//! Modules live in a `pNGb` chunk and the runtime in `pNGr`, both placed
//! directly before `IEND`. Decoders skip unknown ancillary chunks, so the
//! image still opens everywhere.

use pngine_bytecode::Module;

use crate::ContainerError;

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
pub const MODULE_CHUNK: [u8; 4] = *b"pNGb";
pub const RUNTIME_CHUNK: [u8; 4] = *b"pNGr";
const END_CHUNK: [u8; 4] = *b"IEND";
const MAX_CHUNK_LEN: usize = (1 << 31) - 1;

/// One chunk borrowed from a PNG byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
    /// Offset of the length field.
    pub offset: usize,
}

impl Chunk<'_> {
    pub fn kind_str(&self) -> &str {
        std::str::from_utf8(&self.kind).unwrap_or("????")
    }

    pub fn is_critical(&self) -> bool {
        self.kind[0].is_ascii_uppercase()
    }

    /// Length including the length, type and CRC fields.
    pub fn encoded_len(&self) -> usize {
        self.data.len() + 12
    }
}

/// Iterator over the chunks of a PNG, up to and including `IEND`.
///
/// CRCs are verified. Iteration stops after the first error.
pub struct Chunks<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(png: &'a [u8]) -> Result<Self, ContainerError> {
        if !png.starts_with(&SIGNATURE) {
            return Err(ContainerError::NotPng);
        }
        Ok(Self {
            bytes: png,
            pos: SIGNATURE.len(),
            done: false,
        })
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.bytes.len() {
            return None;
        }
        let result = read_chunk(self.bytes, self.pos);
        match &result {
            Ok(chunk) => {
                self.pos += chunk.encoded_len();
                self.done = chunk.kind == END_CHUNK;
            }
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

fn read_chunk(bytes: &[u8], offset: usize) -> Result<Chunk<'_>, ContainerError> {
    let truncated = || ContainerError::Truncated(offset);

    let head = bytes.get(offset..offset + 8).ok_or_else(truncated)?;
    let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize;
    let kind = [head[4], head[5], head[6], head[7]];

    let data_start = offset + 8;
    let data_end = data_start.checked_add(len).ok_or_else(truncated)?;
    let data = bytes.get(data_start..data_end).ok_or_else(truncated)?;
    let stored = bytes.get(data_end..data_end + 4).ok_or_else(truncated)?;
    let stored = u32::from_be_bytes([stored[0], stored[1], stored[2], stored[3]]);

    if stored != crc(&kind, data) {
        return Err(ContainerError::Crc {
            kind: String::from_utf8_lossy(&kind).into_owned(),
            offset,
        });
    }
    Ok(Chunk { kind, data, offset })
}

fn crc(kind: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    hasher.finalize()
}

fn write_chunk(out: &mut Vec<u8>, kind: [u8; 4], data: &[u8]) -> Result<(), ContainerError> {
    if data.len() > MAX_CHUNK_LEN {
        return Err(ContainerError::ChunkTooLarge(data.len()));
    }
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc(&kind, data).to_be_bytes());
    Ok(())
}

fn is_payload(kind: [u8; 4]) -> bool {
    kind == MODULE_CHUNK || kind == RUNTIME_CHUNK
}

/// Copy `png` with `module` (and `runtime`, if given) inserted before `IEND`.
///
/// The module bytes must load. Previously embedded `pNGb`/`pNGr` chunks are
/// dropped; every other chunk is copied byte for byte.
pub fn embed(png: &[u8], module: &[u8], runtime: Option<&[u8]>) -> Result<Vec<u8>, ContainerError> {
    Module::from_bytes(module)?;

    let extra = module.len() + runtime.map_or(0, <[u8]>::len) + 24;
    let mut out = Vec::with_capacity(png.len() + extra);
    out.extend_from_slice(&SIGNATURE);

    let mut ended = false;
    for chunk in Chunks::new(png)? {
        let chunk = chunk?;
        if is_payload(chunk.kind) {
            continue;
        }
        if chunk.kind == END_CHUNK {
            write_chunk(&mut out, MODULE_CHUNK, module)?;
            if let Some(runtime) = runtime {
                write_chunk(&mut out, RUNTIME_CHUNK, runtime)?;
            }
            ended = true;
        }
        out.extend_from_slice(&png[chunk.offset..chunk.offset + chunk.encoded_len()]);
    }
    if !ended {
        return Err(ContainerError::MissingEnd);
    }

    tracing::debug!(
        module = module.len(),
        runtime = runtime.map(<[u8]>::len),
        size = out.len(),
        "embedded module in png"
    );
    Ok(out)
}

/// Payload found in a PNG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embedded {
    pub module: Vec<u8>,
    pub runtime: Option<Vec<u8>>,
}

impl Embedded {
    pub fn load(&self) -> Result<Module, ContainerError> {
        Ok(Module::from_bytes(&self.module)?)
    }
}

/// Read the embedded module and runtime. The first chunk of each kind wins.
pub fn extract(png: &[u8]) -> Result<Embedded, ContainerError> {
    let mut module = None;
    let mut runtime = None;
    for chunk in Chunks::new(png)? {
        let chunk = chunk?;
        if chunk.kind == MODULE_CHUNK {
            module.get_or_insert_with(|| chunk.data.to_vec());
        } else if chunk.kind == RUNTIME_CHUNK {
            runtime.get_or_insert_with(|| chunk.data.to_vec());
        }
    }
    let module = module.ok_or(ContainerError::NoModule)?;
    Ok(Embedded { module, runtime })
}

pub fn has_module(png: &[u8]) -> bool {
    Chunks::new(png).is_ok_and(|mut chunks| {
        chunks.any(|c| c.is_ok_and(|c| c.kind == MODULE_CHUNK))
    })
}

/// Width and height from the image header.
pub fn image_size(png: &[u8]) -> Result<(u32, u32), ContainerError> {
    let reader = png::Decoder::new(png).read_info()?;
    let info = reader.info();
    Ok((info.width, info.height))
}
