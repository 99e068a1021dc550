//! Allocation-free command-buffer iteration.

use pngine_bytecode::bytecode::{
    AddressMode, BindingKind, FilterMode, IndexFormat, LoadOp, PrimitiveTopology,
    SamplerDescriptor, StoreOp, TextureDescriptor, TextureFormat,
};

use super::format::{BIND_ENTRY_LEN, BindEntries, Cmd, Command, HEADER_LEN};
use crate::engine::{DrawArgs, DrawIndexedArgs, PipelineKind};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("command buffer of {0} bytes is shorter than its header")]
    TooShort(usize),
    #[error("header declares {header} bytes, buffer has {actual}")]
    LengthMismatch { header: u32, actual: usize },
    #[error("unknown command 0x{byte:02x} at offset {offset}")]
    UnknownCommand { offset: usize, byte: u8 },
    #[error("record truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("invalid UTF-8 payload at offset {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("invalid {what} value {value} at offset {offset}")]
    InvalidValue {
        what: &'static str,
        value: u32,
        offset: usize,
    },
    #[error("{count} bytes after the last record")]
    TrailingBytes { count: usize },
}

/// Iterates the records of a command buffer.
///
/// Yields at most one error, after which iteration ends.
#[derive(Clone, Debug)]
pub struct CommandReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    count: u16,
    remaining: u16,
    flags: u16,
    done: bool,
}

impl<'a> CommandReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, CommandError> {
        if bytes.len() < HEADER_LEN {
            return Err(CommandError::TooShort(bytes.len()));
        }
        let header = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if header as usize != bytes.len() {
            return Err(CommandError::LengthMismatch {
                header,
                actual: bytes.len(),
            });
        }
        let count = u16::from_le_bytes([bytes[4], bytes[5]]);
        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        Ok(Self {
            bytes,
            pos: HEADER_LEN,
            count,
            remaining: count,
            flags,
            done: false,
        })
    }

    /// Record count declared by the header.
    pub fn declared_count(&self) -> u16 {
        self.count
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    fn u32(&mut self) -> Result<u32, CommandError> {
        let end = self.pos + 4;
        let word = self
            .bytes
            .get(self.pos..end)
            .ok_or(CommandError::Truncated { offset: self.pos })?;
        self.pos = end;
        Ok(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
    }

    fn byte(&mut self, what: &'static str) -> Result<u8, CommandError> {
        let offset = self.pos;
        let value = self.u32()?;
        u8::try_from(value).map_err(|_| CommandError::InvalidValue {
            what,
            value,
            offset,
        })
    }

    fn decode<T>(
        &mut self,
        what: &'static str,
        from: impl FnOnce(u8) -> Option<T>,
    ) -> Result<T, CommandError> {
        let offset = self.pos;
        let byte = self.byte(what)?;
        from(byte).ok_or(CommandError::InvalidValue {
            what,
            value: byte.into(),
            offset,
        })
    }

    fn payload(&mut self) -> Result<&'a [u8], CommandError> {
        let start = self.pos;
        let len = self.u32()? as usize;
        let bytes = self
            .bytes
            .get(self.pos..)
            .and_then(|rest| rest.get(..len))
            .ok_or(CommandError::Truncated { offset: start })?;
        self.pos += len;
        Ok(bytes)
    }

    fn text(&mut self) -> Result<&'a str, CommandError> {
        let offset = self.pos;
        std::str::from_utf8(self.payload()?).map_err(|_| CommandError::InvalidUtf8 { offset })
    }

    fn biased(&mut self) -> Result<Option<u32>, CommandError> {
        Ok(self.u32()?.checked_sub(1))
    }

    fn pipeline_kind(&mut self) -> Result<PipelineKind, CommandError> {
        self.decode("pipeline kind", |b| match b {
            0 => Some(PipelineKind::Render),
            1 => Some(PipelineKind::Compute),
            _ => None,
        })
    }

    fn bind_entries(&mut self) -> Result<BindEntries<'a>, CommandError> {
        let start = self.pos + 4;
        let bytes = self.payload()?;
        if bytes.len() % BIND_ENTRY_LEN != 0 {
            return Err(CommandError::Truncated {
                offset: start + bytes.len(),
            });
        }
        for (i, chunk) in bytes.chunks_exact(BIND_ENTRY_LEN).enumerate() {
            let kind = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            let valid = u8::try_from(kind).ok().and_then(BindingKind::from_u8);
            if valid.is_none() {
                return Err(CommandError::InvalidValue {
                    what: "binding kind",
                    value: kind,
                    offset: start + i * BIND_ENTRY_LEN + 4,
                });
            }
        }
        Ok(BindEntries { bytes })
    }

    fn record(&mut self) -> Result<Command<'a>, CommandError> {
        let offset = self.pos;
        let byte = *self
            .bytes
            .get(offset)
            .ok_or(CommandError::Truncated { offset })?;
        let cmd = Cmd::from_u8(byte).ok_or(CommandError::UnknownCommand { offset, byte })?;
        self.pos += 1;

        Ok(match cmd {
            Cmd::CreateBuffer => Command::CreateBuffer {
                id: self.u32()?,
                size: self.u32()?,
                usage: self.byte("buffer usage")?,
            },
            Cmd::CreateTexture => Command::CreateTexture {
                id: self.u32()?,
                desc: TextureDescriptor {
                    width: self.u32()?,
                    height: self.u32()?,
                    format: self.decode("texture format", TextureFormat::from_u8)?,
                    usage: self.byte("texture usage")?,
                    sample_count: self.byte("sample count")?,
                },
            },
            Cmd::CreateSampler => Command::CreateSampler {
                id: self.u32()?,
                desc: SamplerDescriptor {
                    address_mode: self.decode("address mode", AddressMode::from_u8)?,
                    mag_filter: self.decode("filter mode", FilterMode::from_u8)?,
                    min_filter: self.decode("filter mode", FilterMode::from_u8)?,
                },
            },
            Cmd::CreateShaderModule => Command::CreateShaderModule {
                id: self.u32()?,
                code: self.text()?,
            },
            Cmd::CreateRenderPipeline => Command::CreateRenderPipeline {
                id: self.u32()?,
                shader: self.u32()?,
                topology: self.decode("topology", PrimitiveTopology::from_u8)?,
                format: self.decode("texture format", TextureFormat::from_u8)?,
                vertex_entry: self.text()?,
                fragment_entry: self.text()?,
            },
            Cmd::CreateComputePipeline => Command::CreateComputePipeline {
                id: self.u32()?,
                shader: self.u32()?,
                entry: self.text()?,
            },
            Cmd::CreateBindGroup => Command::CreateBindGroup {
                id: self.u32()?,
                layout_kind: self.pipeline_kind()?,
                layout: self.u32()?,
                index: self.byte("bind group index")?,
                entries: self.bind_entries()?,
            },
            Cmd::BeginRenderPass => Command::BeginRenderPass {
                color: self.biased()?,
                load: self.decode("load op", LoadOp::from_u8)?,
                store: self.decode("store op", StoreOp::from_u8)?,
                depth: self.biased()?,
            },
            Cmd::BeginComputePass => Command::BeginComputePass,
            Cmd::SetPipeline => Command::SetPipeline {
                kind: self.pipeline_kind()?,
                id: self.u32()?,
            },
            Cmd::SetBindGroup => Command::SetBindGroup {
                slot: self.byte("slot")?,
                id: self.u32()?,
            },
            Cmd::SetVertexBuffer => Command::SetVertexBuffer {
                slot: self.byte("slot")?,
                id: self.u32()?,
            },
            Cmd::SetIndexBuffer => Command::SetIndexBuffer {
                id: self.u32()?,
                format: self.decode("index format", IndexFormat::from_u8)?,
            },
            Cmd::Draw => Command::Draw(DrawArgs {
                vertex_count: self.u32()?,
                instance_count: self.u32()?,
                first_vertex: self.u32()?,
                first_instance: self.u32()?,
            }),
            Cmd::DrawIndexed => Command::DrawIndexed(DrawIndexedArgs {
                index_count: self.u32()?,
                instance_count: self.u32()?,
                first_index: self.u32()?,
                base_vertex: self.u32()?,
                first_instance: self.u32()?,
            }),
            Cmd::Dispatch => Command::Dispatch {
                x: self.u32()?,
                y: self.u32()?,
                z: self.u32()?,
            },
            Cmd::EndPass => Command::EndPass,
            Cmd::WriteBuffer => Command::WriteBuffer {
                id: self.u32()?,
                offset: self.u32()?,
                data: self.payload()?,
            },
            Cmd::Submit => Command::Submit,
        })
    }
}

impl<'a> Iterator for CommandReader<'a> {
    type Item = Result<Command<'a>, CommandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.remaining == 0 {
            self.done = true;
            let count = self.bytes.len() - self.pos;
            return (count > 0).then_some(Err(CommandError::TrailingBytes { count }));
        }
        self.remaining -= 1;
        let result = self.record();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
