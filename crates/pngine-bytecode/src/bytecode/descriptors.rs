//! Resource descriptor blobs stored in the data section.
//!
//! Descriptors use the same varint encoding as instruction operands. Each
//! blob must be consumed exactly; trailing bytes are an error.

use super::cursor::Cursor;
use super::error::{DecodeError, EncodeError};
use super::ids::StringId;
use super::varint;

macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($what:literal) { $($variant:ident = $value:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value),*
        }

        impl $name {
            pub fn from_u8(byte: u8) -> Option<Self> {
                match byte {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }

            fn read(cur: &mut Cursor<'_>) -> Result<Self, DecodeError> {
                let offset = cur.pos();
                let byte = cur.read_u8()?;
                Self::from_u8(byte).ok_or(DecodeError::InvalidValue {
                    what: $what,
                    value: byte as u32,
                    offset,
                })
            }
        }
    };
}

byte_enum! {
    /// Texel format of a texture or render target.
    TextureFormat("texture format") {
        Rgba8Unorm = 0,
        Bgra8Unorm = 1,
        Rgba16Float = 2,
        R32Float = 3,
        Depth24Plus = 4,
    }
}

byte_enum! {
    AddressMode("address mode") {
        ClampToEdge = 0,
        Repeat = 1,
        MirrorRepeat = 2,
    }
}

byte_enum! {
    FilterMode("filter mode") {
        Nearest = 0,
        Linear = 1,
    }
}

byte_enum! {
    PrimitiveTopology("topology") {
        TriangleList = 0,
        TriangleStrip = 1,
        LineList = 2,
        LineStrip = 3,
        PointList = 4,
    }
}

byte_enum! {
    /// What a bind-group entry binds.
    BindingKind("binding kind") {
        UniformBuffer = 0,
        StorageBuffer = 1,
        ReadOnlyStorageBuffer = 2,
        Texture = 3,
        Sampler = 4,
    }
}

impl BindingKind {
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            Self::UniformBuffer | Self::StorageBuffer | Self::ReadOnlyStorageBuffer
        )
    }
}

/// Texture usage bits.
pub mod texture_usage {
    pub const COPY_SRC: u8 = 0x01;
    pub const COPY_DST: u8 = 0x02;
    pub const TEXTURE_BINDING: u8 = 0x04;
    pub const STORAGE_BINDING: u8 = 0x08;
    pub const RENDER_ATTACHMENT: u8 = 0x10;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: u8,
    pub sample_count: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SamplerDescriptor {
    pub address_mode: AddressMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
}

/// Render pipeline descriptor. Entry points are string-table references.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderPipelineDescriptor {
    pub vertex_entry: StringId,
    pub fragment_entry: StringId,
    pub topology: PrimitiveTopology,
    pub format: TextureFormat,
}

/// One bind-group entry. `size == 0` binds the whole buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BindEntry {
    pub binding: u32,
    pub kind: BindingKind,
    pub resource: u32,
    pub offset: u32,
    pub size: u32,
}

impl TextureDescriptor {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = Cursor::new(bytes);
        let width = cur.read_varint()?;
        let height = cur.read_varint()?;
        let format = TextureFormat::read(&mut cur)?;
        let usage = cur.read_u8()?;
        let sample_count = cur.read_u8()?;
        cur.finish("texture descriptor")?;

        Ok(Self {
            width,
            height,
            format,
            usage,
            sample_count,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        varint::encode(self.width, &mut out)?;
        varint::encode(self.height, &mut out)?;
        out.extend_from_slice(&[self.format as u8, self.usage, self.sample_count]);
        Ok(out)
    }
}

impl SamplerDescriptor {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = Cursor::new(bytes);
        let address_mode = AddressMode::read(&mut cur)?;
        let mag_filter = FilterMode::read(&mut cur)?;
        let min_filter = FilterMode::read(&mut cur)?;
        cur.finish("sampler descriptor")?;

        Ok(Self {
            address_mode,
            mag_filter,
            min_filter,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        vec![
            self.address_mode as u8,
            self.mag_filter as u8,
            self.min_filter as u8,
        ]
    }
}

impl RenderPipelineDescriptor {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = Cursor::new(bytes);
        let vertex_entry = StringId(cur.read_varint()?);
        let fragment_entry = StringId(cur.read_varint()?);
        let topology = PrimitiveTopology::read(&mut cur)?;
        let format = TextureFormat::read(&mut cur)?;
        cur.finish("render pipeline descriptor")?;

        Ok(Self {
            vertex_entry,
            fragment_entry,
            topology,
            format,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        varint::encode(self.vertex_entry.get(), &mut out)?;
        varint::encode(self.fragment_entry.get(), &mut out)?;
        out.extend_from_slice(&[self.topology as u8, self.format as u8]);
        Ok(out)
    }
}

/// Decode a bind-group entry list.
pub fn decode_bind_entries(bytes: &[u8]) -> Result<Vec<BindEntry>, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let count = cur.read_varint()? as usize;
    // Each entry takes at least 5 bytes.
    if count > cur.remaining() / 5 {
        return Err(DecodeError::UnexpectedEof { offset: bytes.len() });
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let binding = cur.read_varint()?;
        let kind = BindingKind::read(&mut cur)?;
        let resource = cur.read_varint()?;
        let offset = cur.read_varint()?;
        let size = cur.read_varint()?;
        entries.push(BindEntry {
            binding,
            kind,
            resource,
            offset,
            size,
        });
    }
    cur.finish("bind group entries")?;
    Ok(entries)
}

pub fn encode_bind_entries(entries: &[BindEntry]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    varint::encode(entries.len() as u32, &mut out)?;
    for e in entries {
        varint::encode(e.binding, &mut out)?;
        out.push(e.kind as u8);
        varint::encode(e.resource, &mut out)?;
        varint::encode(e.offset, &mut out)?;
        varint::encode(e.size, &mut out)?;
    }
    Ok(out)
}
