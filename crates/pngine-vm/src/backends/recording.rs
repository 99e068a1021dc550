//! Backend that serializes every call into a command buffer.

use pngine_bytecode::bytecode::{
    BindingKind, IndexFormat, LoadOp, SamplerDescriptor, StoreOp, TextureDescriptor,
};

use crate::command::{Cmd, CommandWriter};
use crate::engine::{
    Backend, BackendError, BindGroupEntry, BindResource, BufferDesc, ColorTarget, DrawArgs,
    DrawIndexedArgs, PipelineKind, PipelineRef, RenderPipelineDesc,
};

/// Records calls; handles are resource IDs.
#[derive(Debug)]
pub struct RecordingBackend {
    writer: CommandWriter,
    width: u32,
    height: u32,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            writer: CommandWriter::new(),
            width,
            height,
        }
    }

    /// Records written since the last [`take`](Self::take).
    pub fn pending(&self) -> usize {
        self.writer.count()
    }

    /// Finish the current buffer and start a new one.
    pub fn take(&mut self) -> Vec<u8> {
        self.writer.finish()
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.writer.finish()
    }

    fn record(&mut self, cmd: Cmd, fields: &[u32]) -> Result<&mut CommandWriter, BackendError> {
        let w = self.writer.begin(cmd)?;
        for &f in fields {
            w.u32(f);
        }
        Ok(w)
    }
}

fn pipeline_id(pipeline: &PipelineRef<'_, RecordingBackend>) -> (u32, u32) {
    match pipeline {
        PipelineRef::Render(id) => (kind_code(PipelineKind::Render), **id),
        PipelineRef::Compute(id) => (kind_code(PipelineKind::Compute), **id),
    }
}

fn kind_code(kind: PipelineKind) -> u32 {
    crate::command::pipeline_kind_code(kind)
}

impl Backend for RecordingBackend {
    type Buffer = u32;
    type Texture = u32;
    type Sampler = u32;
    type ShaderModule = u32;
    type RenderPipeline = u32;
    type ComputePipeline = u32;
    type BindGroup = u32;

    fn create_buffer(&mut self, id: u32, desc: &BufferDesc) -> Result<u32, BackendError> {
        self.record(Cmd::CreateBuffer, &[id, desc.size, desc.usage.into()])?;
        Ok(id)
    }

    fn create_texture(&mut self, id: u32, desc: &TextureDescriptor) -> Result<u32, BackendError> {
        self.record(
            Cmd::CreateTexture,
            &[
                id,
                desc.width,
                desc.height,
                desc.format as u32,
                desc.usage.into(),
                desc.sample_count.into(),
            ],
        )?;
        Ok(id)
    }

    fn create_sampler(&mut self, id: u32, desc: &SamplerDescriptor) -> Result<u32, BackendError> {
        self.record(
            Cmd::CreateSampler,
            &[
                id,
                desc.address_mode as u32,
                desc.mag_filter as u32,
                desc.min_filter as u32,
            ],
        )?;
        Ok(id)
    }

    fn create_shader_module(&mut self, id: u32, code: &str) -> Result<u32, BackendError> {
        self.record(Cmd::CreateShaderModule, &[id])?
            .payload(code.as_bytes());
        Ok(id)
    }

    fn create_render_pipeline(
        &mut self,
        id: u32,
        shader: &u32,
        desc: &RenderPipelineDesc<'_>,
    ) -> Result<u32, BackendError> {
        self.record(
            Cmd::CreateRenderPipeline,
            &[id, *shader, desc.topology as u32, desc.format as u32],
        )?
        .payload(desc.vertex_entry.as_bytes())
        .payload(desc.fragment_entry.as_bytes());
        Ok(id)
    }

    fn create_compute_pipeline(
        &mut self,
        id: u32,
        shader: &u32,
        entry: &str,
    ) -> Result<u32, BackendError> {
        self.record(Cmd::CreateComputePipeline, &[id, *shader])?
            .payload(entry.as_bytes());
        Ok(id)
    }

    fn create_bind_group(
        &mut self,
        id: u32,
        layout: PipelineRef<'_, Self>,
        index: u8,
        entries: &[BindGroupEntry<'_, Self>],
    ) -> Result<u32, BackendError> {
        let mut payload = Vec::with_capacity(entries.len() * 20);
        for entry in entries {
            let (kind, resource, offset, size) = match entry.resource {
                BindResource::Buffer {
                    buffer,
                    kind,
                    offset,
                    size,
                } => (kind, *buffer, offset, size),
                BindResource::Texture(t) => (BindingKind::Texture, *t, 0, 0),
                BindResource::Sampler(s) => (BindingKind::Sampler, *s, 0, 0),
            };
            for word in [entry.binding, kind as u32, resource, offset, size] {
                payload.extend_from_slice(&word.to_le_bytes());
            }
        }
        let (layout_kind, layout_id) = pipeline_id(&layout);
        self.record(
            Cmd::CreateBindGroup,
            &[id, layout_kind, layout_id, index.into()],
        )?
        .payload(&payload);
        Ok(id)
    }

    fn begin_render_pass(
        &mut self,
        color: ColorTarget<'_, u32>,
        load: LoadOp,
        store: StoreOp,
        depth: Option<&u32>,
    ) -> Result<(), BackendError> {
        let color = match color {
            ColorTarget::Default => 0,
            ColorTarget::Texture(t) => t + 1,
        };
        let depth = depth.map_or(0, |d| d + 1);
        self.record(
            Cmd::BeginRenderPass,
            &[color, load as u32, store as u32, depth],
        )?;
        Ok(())
    }

    fn begin_compute_pass(&mut self) -> Result<(), BackendError> {
        self.record(Cmd::BeginComputePass, &[])?;
        Ok(())
    }

    fn set_pipeline(&mut self, pipeline: PipelineRef<'_, Self>) -> Result<(), BackendError> {
        let (kind, id) = pipeline_id(&pipeline);
        self.record(Cmd::SetPipeline, &[kind, id])?;
        Ok(())
    }

    fn set_bind_group(&mut self, slot: u8, group: &u32) -> Result<(), BackendError> {
        self.record(Cmd::SetBindGroup, &[slot.into(), *group])?;
        Ok(())
    }

    fn set_vertex_buffer(&mut self, slot: u8, buffer: &u32) -> Result<(), BackendError> {
        self.record(Cmd::SetVertexBuffer, &[slot.into(), *buffer])?;
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: &u32, format: IndexFormat) -> Result<(), BackendError> {
        self.record(Cmd::SetIndexBuffer, &[*buffer, format as u32])?;
        Ok(())
    }

    fn draw(&mut self, args: DrawArgs) -> Result<(), BackendError> {
        self.record(
            Cmd::Draw,
            &[
                args.vertex_count,
                args.instance_count,
                args.first_vertex,
                args.first_instance,
            ],
        )?;
        Ok(())
    }

    fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<(), BackendError> {
        self.record(
            Cmd::DrawIndexed,
            &[
                args.index_count,
                args.instance_count,
                args.first_index,
                args.base_vertex,
                args.first_instance,
            ],
        )?;
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), BackendError> {
        self.record(Cmd::Dispatch, &[x, y, z])?;
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        self.record(Cmd::EndPass, &[])?;
        Ok(())
    }

    fn write_buffer(&mut self, buffer: &u32, offset: u32, data: &[u8]) -> Result<(), BackendError> {
        self.record(Cmd::WriteBuffer, &[*buffer, offset])?
            .payload(data);
        Ok(())
    }

    fn submit(&mut self) -> Result<(), BackendError> {
        self.record(Cmd::Submit, &[])?;
        Ok(())
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
