//! Record layouts and the writer.
//!
//! | byte | command | fields | payloads |
//! |---|---|---|---|
//! | `0x01` | create_buffer | id, size, usage | |
//! | `0x02` | create_texture | id, width, height, format, usage, samples | |
//! | `0x03` | create_sampler | id, address, mag, min | |
//! | `0x04` | create_shader_module | id | code |
//! | `0x05` | create_render_pipeline | id, shader, topology, format | vertex, fragment |
//! | `0x06` | create_compute_pipeline | id, shader | entry |
//! | `0x07` | create_bind_group | id, layout kind, layout, index | entries |
//! | `0x10` | begin_render_pass | color+1, load, store, depth+1 | |
//! | `0x11` | begin_compute_pass | | |
//! | `0x12` | set_pipeline | kind, id | |
//! | `0x13` | set_bind_group | slot, id | |
//! | `0x14` | set_vertex_buffer | slot, id | |
//! | `0x15` | set_index_buffer | id, format | |
//! | `0x16` | draw | vertices, instances, first vertex, first instance | |
//! | `0x17` | draw_indexed | indices, instances, first index, base vertex, first instance | |
//! | `0x18` | dispatch | x, y, z | |
//! | `0x19` | end_pass | | |
//! | `0x20` | write_buffer | id, offset | data |
//! | `0x22` | submit | | |
//!
//! Bind-group entries are `(binding, kind, resource, offset, size)` tuples
//! of `u32`, 20 bytes each.

use pngine_bytecode::bytecode::{
    BindEntry, BindingKind, IndexFormat, LoadOp, PrimitiveTopology, SamplerDescriptor, StoreOp,
    TextureDescriptor, TextureFormat,
};

use crate::engine::{BackendError, DrawArgs, DrawIndexedArgs, PipelineKind};

pub const HEADER_LEN: usize = 8;
pub const MAX_COMMANDS: usize = 65_535;
pub(crate) const BIND_ENTRY_LEN: usize = 20;

/// Header flag bits summarizing a buffer's contents.
pub mod flags {
    pub const COMPUTE: u16 = 0x1;
    pub const INDEXED: u16 = 0x2;
    pub const WRITES: u16 = 0x4;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cmd {
    CreateBuffer = 0x01,
    CreateTexture = 0x02,
    CreateSampler = 0x03,
    CreateShaderModule = 0x04,
    CreateRenderPipeline = 0x05,
    CreateComputePipeline = 0x06,
    CreateBindGroup = 0x07,
    BeginRenderPass = 0x10,
    BeginComputePass = 0x11,
    SetPipeline = 0x12,
    SetBindGroup = 0x13,
    SetVertexBuffer = 0x14,
    SetIndexBuffer = 0x15,
    Draw = 0x16,
    DrawIndexed = 0x17,
    Dispatch = 0x18,
    EndPass = 0x19,
    WriteBuffer = 0x20,
    Submit = 0x22,
}

impl Cmd {
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Self::CreateBuffer,
            0x02 => Self::CreateTexture,
            0x03 => Self::CreateSampler,
            0x04 => Self::CreateShaderModule,
            0x05 => Self::CreateRenderPipeline,
            0x06 => Self::CreateComputePipeline,
            0x07 => Self::CreateBindGroup,
            0x10 => Self::BeginRenderPass,
            0x11 => Self::BeginComputePass,
            0x12 => Self::SetPipeline,
            0x13 => Self::SetBindGroup,
            0x14 => Self::SetVertexBuffer,
            0x15 => Self::SetIndexBuffer,
            0x16 => Self::Draw,
            0x17 => Self::DrawIndexed,
            0x18 => Self::Dispatch,
            0x19 => Self::EndPass,
            0x20 => Self::WriteBuffer,
            0x22 => Self::Submit,
            _ => return None,
        })
    }

    fn flag(self) -> u16 {
        match self {
            Self::BeginComputePass | Self::Dispatch => flags::COMPUTE,
            Self::DrawIndexed => flags::INDEXED,
            Self::WriteBuffer => flags::WRITES,
            _ => 0,
        }
    }
}

/// Bind-group entries borrowed from a record payload.
///
/// The reader validates every entry, so iteration cannot fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindEntries<'a> {
    pub(crate) bytes: &'a [u8],
}

impl<'a> BindEntries<'a> {
    pub fn len(&self) -> usize {
        self.bytes.len() / BIND_ENTRY_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BindEntry> + 'a {
        self.bytes.chunks_exact(BIND_ENTRY_LEN).filter_map(|chunk| {
            let field = |i: usize| {
                let mut word = [0u8; 4];
                word.copy_from_slice(&chunk[i * 4..i * 4 + 4]);
                u32::from_le_bytes(word)
            };
            let kind = u8::try_from(field(1)).ok().and_then(BindingKind::from_u8)?;
            Some(BindEntry {
                binding: field(0),
                kind,
                resource: field(2),
                offset: field(3),
                size: field(4),
            })
        })
    }
}

/// One decoded record. Payloads borrow from the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    CreateBuffer {
        id: u32,
        size: u32,
        usage: u8,
    },
    CreateTexture {
        id: u32,
        desc: TextureDescriptor,
    },
    CreateSampler {
        id: u32,
        desc: SamplerDescriptor,
    },
    CreateShaderModule {
        id: u32,
        code: &'a str,
    },
    CreateRenderPipeline {
        id: u32,
        shader: u32,
        topology: PrimitiveTopology,
        format: TextureFormat,
        vertex_entry: &'a str,
        fragment_entry: &'a str,
    },
    CreateComputePipeline {
        id: u32,
        shader: u32,
        entry: &'a str,
    },
    CreateBindGroup {
        id: u32,
        layout_kind: PipelineKind,
        layout: u32,
        index: u8,
        entries: BindEntries<'a>,
    },
    BeginRenderPass {
        color: Option<u32>,
        load: LoadOp,
        store: StoreOp,
        depth: Option<u32>,
    },
    BeginComputePass,
    SetPipeline {
        kind: PipelineKind,
        id: u32,
    },
    SetBindGroup {
        slot: u8,
        id: u32,
    },
    SetVertexBuffer {
        slot: u8,
        id: u32,
    },
    SetIndexBuffer {
        id: u32,
        format: IndexFormat,
    },
    Draw(DrawArgs),
    DrawIndexed(DrawIndexedArgs),
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    EndPass,
    WriteBuffer {
        id: u32,
        offset: u32,
        data: &'a [u8],
    },
    Submit,
}

impl Command<'_> {
    pub fn cmd(&self) -> Cmd {
        match self {
            Self::CreateBuffer { .. } => Cmd::CreateBuffer,
            Self::CreateTexture { .. } => Cmd::CreateTexture,
            Self::CreateSampler { .. } => Cmd::CreateSampler,
            Self::CreateShaderModule { .. } => Cmd::CreateShaderModule,
            Self::CreateRenderPipeline { .. } => Cmd::CreateRenderPipeline,
            Self::CreateComputePipeline { .. } => Cmd::CreateComputePipeline,
            Self::CreateBindGroup { .. } => Cmd::CreateBindGroup,
            Self::BeginRenderPass { .. } => Cmd::BeginRenderPass,
            Self::BeginComputePass => Cmd::BeginComputePass,
            Self::SetPipeline { .. } => Cmd::SetPipeline,
            Self::SetBindGroup { .. } => Cmd::SetBindGroup,
            Self::SetVertexBuffer { .. } => Cmd::SetVertexBuffer,
            Self::SetIndexBuffer { .. } => Cmd::SetIndexBuffer,
            Self::Draw(_) => Cmd::Draw,
            Self::DrawIndexed(_) => Cmd::DrawIndexed,
            Self::Dispatch { .. } => Cmd::Dispatch,
            Self::EndPass => Cmd::EndPass,
            Self::WriteBuffer { .. } => Cmd::WriteBuffer,
            Self::Submit => Cmd::Submit,
        }
    }
}

pub fn pipeline_kind_code(kind: PipelineKind) -> u32 {
    match kind {
        PipelineKind::Render => 0,
        PipelineKind::Compute => 1,
    }
}

/// Appends records and patches the header on [`finish`](Self::finish).
#[derive(Debug)]
pub struct CommandWriter {
    buf: Vec<u8>,
    count: usize,
    flags: u16,
}

impl Default for CommandWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandWriter {
    pub fn new() -> Self {
        Self {
            buf: vec![0; HEADER_LEN],
            count: 0,
            flags: 0,
        }
    }

    /// Number of records written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn begin(&mut self, cmd: Cmd) -> Result<&mut Self, BackendError> {
        if self.count >= MAX_COMMANDS {
            return Err(BackendError::TooManyCommands(MAX_COMMANDS));
        }
        self.buf.push(cmd as u8);
        self.count += 1;
        self.flags |= cmd.flag();
        Ok(self)
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn payload(&mut self, bytes: &[u8]) -> &mut Self {
        self.u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Complete the buffer and reset the writer.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = std::mem::replace(&mut self.buf, vec![0; HEADER_LEN]);
        let len = out.len() as u32;
        out[0..4].copy_from_slice(&len.to_le_bytes());
        out[4..6].copy_from_slice(&(self.count as u16).to_le_bytes());
        out[6..8].copy_from_slice(&self.flags.to_le_bytes());
        self.count = 0;
        self.flags = 0;
        out
    }
}
