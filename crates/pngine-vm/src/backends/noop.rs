//! Validating backend that performs no work.
//!
//! Every call is checked against the limits a WebGPU device would enforce
//! and appended to a call log. Handles are the resource IDs themselves.

use serde::Serialize;

use pngine_bytecode::bytecode::{
    IndexFormat, LoadOp, SamplerDescriptor, StoreOp, TextureDescriptor,
};

use crate::engine::{
    Backend, BackendError, BindGroupEntry, BindResource, BufferDesc, ColorTarget, DrawArgs,
    DrawIndexedArgs, PipelineRef, RenderPipelineDesc,
};

pub const MAX_BIND_GROUPS: u8 = 4;
pub const MAX_VERTEX_BUFFERS: u8 = 8;
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// One logged backend call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    CreateBuffer { id: u32, size: u32, usage: u8 },
    CreateTexture { id: u32, width: u32, height: u32 },
    CreateSampler { id: u32 },
    CreateShaderModule { id: u32, bytes: usize },
    CreateRenderPipeline { id: u32, shader: u32, vertex: String, fragment: String },
    CreateComputePipeline { id: u32, shader: u32, entry: String },
    CreateBindGroup { id: u32, layout: u32, index: u8, entries: usize },
    BeginRenderPass { color: Option<u32>, clear: bool, depth: Option<u32> },
    BeginComputePass,
    SetPipeline { id: u32 },
    SetBindGroup { slot: u8, id: u32 },
    SetVertexBuffer { slot: u8, id: u32 },
    SetIndexBuffer { id: u32, wide: bool },
    Draw { vertices: u32, instances: u32 },
    DrawIndexed { indices: u32, instances: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    EndPass,
    WriteBuffer { id: u32, offset: u32, bytes: usize },
    Submit,
}

#[derive(Debug)]
pub struct NoopBackend {
    calls: Vec<Call>,
    width: u32,
    height: u32,
}

impl Default for NoopBackend {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

impl NoopBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            width,
            height,
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn log(&mut self, call: Call) -> Result<(), BackendError> {
        self.calls.push(call);
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> BackendError {
    BackendError::Invalid(msg.into())
}

impl Backend for NoopBackend {
    type Buffer = u32;
    type Texture = u32;
    type Sampler = u32;
    type ShaderModule = u32;
    type RenderPipeline = u32;
    type ComputePipeline = u32;
    type BindGroup = u32;

    fn create_buffer(&mut self, id: u32, desc: &BufferDesc) -> Result<u32, BackendError> {
        self.log(Call::CreateBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
        })?;
        Ok(id)
    }

    fn create_texture(&mut self, id: u32, desc: &TextureDescriptor) -> Result<u32, BackendError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(invalid("texture dimensions must be non-zero"));
        }
        if !matches!(desc.sample_count, 1 | 4) {
            return Err(invalid(format!(
                "sample count {} must be 1 or 4",
                desc.sample_count
            )));
        }
        self.log(Call::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
        })?;
        Ok(id)
    }

    fn create_sampler(&mut self, id: u32, _desc: &SamplerDescriptor) -> Result<u32, BackendError> {
        self.log(Call::CreateSampler { id })?;
        Ok(id)
    }

    fn create_shader_module(&mut self, id: u32, code: &str) -> Result<u32, BackendError> {
        if code.trim().is_empty() {
            return Err(invalid("empty shader source"));
        }
        self.log(Call::CreateShaderModule {
            id,
            bytes: code.len(),
        })?;
        Ok(id)
    }

    fn create_render_pipeline(
        &mut self,
        id: u32,
        shader: &u32,
        desc: &RenderPipelineDesc<'_>,
    ) -> Result<u32, BackendError> {
        if desc.vertex_entry.is_empty() || desc.fragment_entry.is_empty() {
            return Err(invalid("empty entry point name"));
        }
        self.log(Call::CreateRenderPipeline {
            id,
            shader: *shader,
            vertex: desc.vertex_entry.to_owned(),
            fragment: desc.fragment_entry.to_owned(),
        })?;
        Ok(id)
    }

    fn create_compute_pipeline(
        &mut self,
        id: u32,
        shader: &u32,
        entry: &str,
    ) -> Result<u32, BackendError> {
        if entry.is_empty() {
            return Err(invalid("empty entry point name"));
        }
        self.log(Call::CreateComputePipeline {
            id,
            shader: *shader,
            entry: entry.to_owned(),
        })?;
        Ok(id)
    }

    fn create_bind_group(
        &mut self,
        id: u32,
        layout: PipelineRef<'_, Self>,
        index: u8,
        entries: &[BindGroupEntry<'_, Self>],
    ) -> Result<u32, BackendError> {
        if index >= MAX_BIND_GROUPS {
            return Err(invalid(format!("bind group index {index} out of range")));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.binding == entry.binding) {
                return Err(invalid(format!("duplicate binding {}", entry.binding)));
            }
            if let BindResource::Buffer { offset, .. } = entry.resource
                && offset % 256 != 0
            {
                return Err(invalid(format!(
                    "binding {} offset {offset} is not 256-byte aligned",
                    entry.binding
                )));
            }
        }
        let layout = match layout {
            PipelineRef::Render(p) | PipelineRef::Compute(p) => *p,
        };
        self.log(Call::CreateBindGroup {
            id,
            layout,
            index,
            entries: entries.len(),
        })?;
        Ok(id)
    }

    fn begin_render_pass(
        &mut self,
        color: ColorTarget<'_, u32>,
        load: LoadOp,
        _store: StoreOp,
        depth: Option<&u32>,
    ) -> Result<(), BackendError> {
        let color = match color {
            ColorTarget::Default => None,
            ColorTarget::Texture(t) => Some(*t),
        };
        self.log(Call::BeginRenderPass {
            color,
            clear: load == LoadOp::Clear,
            depth: depth.copied(),
        })
    }

    fn begin_compute_pass(&mut self) -> Result<(), BackendError> {
        self.log(Call::BeginComputePass)
    }

    fn set_pipeline(&mut self, pipeline: PipelineRef<'_, Self>) -> Result<(), BackendError> {
        let id = match pipeline {
            PipelineRef::Render(p) | PipelineRef::Compute(p) => *p,
        };
        self.log(Call::SetPipeline { id })
    }

    fn set_bind_group(&mut self, slot: u8, group: &u32) -> Result<(), BackendError> {
        if slot >= MAX_BIND_GROUPS {
            return Err(invalid(format!("bind group slot {slot} out of range")));
        }
        self.log(Call::SetBindGroup { slot, id: *group })
    }

    fn set_vertex_buffer(&mut self, slot: u8, buffer: &u32) -> Result<(), BackendError> {
        if slot >= MAX_VERTEX_BUFFERS {
            return Err(invalid(format!("vertex buffer slot {slot} out of range")));
        }
        self.log(Call::SetVertexBuffer { slot, id: *buffer })
    }

    fn set_index_buffer(&mut self, buffer: &u32, format: IndexFormat) -> Result<(), BackendError> {
        self.log(Call::SetIndexBuffer {
            id: *buffer,
            wide: format == IndexFormat::Uint32,
        })
    }

    fn draw(&mut self, args: DrawArgs) -> Result<(), BackendError> {
        self.log(Call::Draw {
            vertices: args.vertex_count,
            instances: args.instance_count,
        })
    }

    fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<(), BackendError> {
        self.log(Call::DrawIndexed {
            indices: args.index_count,
            instances: args.instance_count,
        })
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), BackendError> {
        if [x, y, z].iter().any(|&n| n > MAX_WORKGROUPS_PER_DIMENSION) {
            return Err(invalid(format!(
                "dispatch ({x}, {y}, {z}) exceeds {MAX_WORKGROUPS_PER_DIMENSION} workgroups per dimension"
            )));
        }
        self.log(Call::Dispatch { x, y, z })
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        self.log(Call::EndPass)
    }

    fn write_buffer(&mut self, buffer: &u32, offset: u32, data: &[u8]) -> Result<(), BackendError> {
        if offset % 4 != 0 || data.len() % 4 != 0 {
            return Err(invalid("buffer writes must be 4-byte aligned"));
        }
        self.log(Call::WriteBuffer {
            id: *buffer,
            offset,
            bytes: data.len(),
        })
    }

    fn submit(&mut self) -> Result<(), BackendError> {
        self.log(Call::Submit)
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
