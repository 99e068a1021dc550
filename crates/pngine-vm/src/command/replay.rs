//! Drive a backend from a recorded command buffer.

use pngine_bytecode::bytecode::BindingKind;

use crate::engine::{
    Backend, BackendError, BindGroupEntry, BindResource, BufferDesc, BufferSlot, ColorTarget,
    PipelineSlot, RenderPipelineDesc, ResourceError, ResourceTable, RuntimeError,
};

use super::format::Command;
use super::reader::{CommandError, CommandReader};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("command {index}: {source}")]
    Resource {
        index: usize,
        source: ResourceError,
    },
    #[error("command {index}: backend: {source}")]
    Backend {
        index: usize,
        source: BackendError,
    },
    /// A write or binding range outside its buffer.
    #[error("command {index}: {source}")]
    Bounds {
        index: usize,
        source: RuntimeError,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub commands: usize,
    pub draws: usize,
    pub dispatches: usize,
}

enum Fault {
    Resource(ResourceError),
    Backend(BackendError),
    Bounds(RuntimeError),
}

impl From<ResourceError> for Fault {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

impl From<BackendError> for Fault {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

impl From<RuntimeError> for Fault {
    fn from(e: RuntimeError) -> Self {
        Self::Bounds(e)
    }
}

/// Replays command buffers, keeping created resources between buffers so
/// per-frame buffers can follow a setup buffer.
pub struct Replayer<B: Backend> {
    resources: ResourceTable<B>,
    max_id: u32,
}

impl<B: Backend> Default for Replayer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Replayer<B> {
    pub fn new() -> Self {
        Self {
            resources: ResourceTable::new(),
            max_id: crate::engine::Limits::default().max_resource_id,
        }
    }

    pub fn resources(&self) -> &ResourceTable<B> {
        &self.resources
    }

    pub fn replay(&mut self, bytes: &[u8], backend: &mut B) -> Result<ReplayStats, ReplayError> {
        let mut stats = ReplayStats::default();
        for (index, command) in CommandReader::new(bytes)?.enumerate() {
            let command = command?;
            self.apply(&command, backend).map_err(|fault| match fault {
                Fault::Resource(source) => ReplayError::Resource { index, source },
                Fault::Backend(source) => ReplayError::Backend { index, source },
                Fault::Bounds(source) => ReplayError::Bounds { index, source },
            })?;
            stats.commands += 1;
            match command {
                Command::Draw(_) | Command::DrawIndexed(_) => stats.draws += 1,
                Command::Dispatch { .. } => stats.dispatches += 1,
                _ => {}
            }
        }
        tracing::debug!(commands = stats.commands, "replayed command buffer");
        Ok(stats)
    }

    fn apply(&mut self, command: &Command<'_>, backend: &mut B) -> Result<(), Fault> {
        let res = &mut self.resources;
        let max_id = self.max_id;

        match *command {
            Command::CreateBuffer { id, size, usage } => {
                res.buffers.check_free(id, max_id)?;
                let handle = backend.create_buffer(id, &BufferDesc { size, usage })?;
                res.buffers.insert(id, BufferSlot { handle, size }, max_id)?;
            }
            Command::CreateTexture { id, desc } => {
                res.textures.check_free(id, max_id)?;
                let handle = backend.create_texture(id, &desc)?;
                res.textures.insert(id, handle, max_id)?;
            }
            Command::CreateSampler { id, desc } => {
                res.samplers.check_free(id, max_id)?;
                let handle = backend.create_sampler(id, &desc)?;
                res.samplers.insert(id, handle, max_id)?;
            }
            Command::CreateShaderModule { id, code } => {
                res.shaders.check_free(id, max_id)?;
                let handle = backend.create_shader_module(id, code)?;
                res.shaders.insert(id, handle, max_id)?;
            }
            Command::CreateRenderPipeline {
                id,
                shader,
                topology,
                format,
                vertex_entry,
                fragment_entry,
            } => {
                res.pipelines.check_free(id, max_id)?;
                let desc = RenderPipelineDesc {
                    vertex_entry,
                    fragment_entry,
                    topology,
                    format,
                };
                let handle = backend.create_render_pipeline(id, res.shaders.get(shader)?, &desc)?;
                res.pipelines.insert(id, PipelineSlot::Render(handle), max_id)?;
            }
            Command::CreateComputePipeline { id, shader, entry } => {
                res.pipelines.check_free(id, max_id)?;
                let handle = backend.create_compute_pipeline(id, res.shaders.get(shader)?, entry)?;
                res.pipelines.insert(id, PipelineSlot::Compute(handle), max_id)?;
            }
            Command::CreateBindGroup {
                id,
                layout_kind,
                layout,
                index,
                entries,
            } => {
                res.bind_groups.check_free(id, max_id)?;
                let pipeline = res.pipeline_of(layout, layout_kind)?;
                let mut resolved = Vec::with_capacity(entries.len());
                for e in entries.iter() {
                    let resource = if e.kind.is_buffer() {
                        let slot = res.buffer(e.resource)?;
                        BindResource::Buffer {
                            buffer: &slot.handle,
                            kind: e.kind,
                            offset: e.offset,
                            size: slot.bind_size(e.resource, e.offset, e.size)?,
                        }
                    } else if e.kind == BindingKind::Texture {
                        BindResource::Texture(res.textures.get(e.resource)?)
                    } else {
                        BindResource::Sampler(res.samplers.get(e.resource)?)
                    };
                    resolved.push(BindGroupEntry {
                        binding: e.binding,
                        resource,
                    });
                }
                let handle = backend.create_bind_group(id, pipeline, index, &resolved)?;
                res.bind_groups.insert(id, handle, max_id)?;
            }
            Command::BeginRenderPass {
                color,
                load,
                store,
                depth,
            } => {
                let color = match color {
                    None => ColorTarget::Default,
                    Some(id) => ColorTarget::Texture(res.textures.get(id)?),
                };
                let depth = match depth {
                    None => None,
                    Some(id) => Some(res.textures.get(id)?),
                };
                backend.begin_render_pass(color, load, store, depth)?;
            }
            Command::BeginComputePass => backend.begin_compute_pass()?,
            Command::SetPipeline { kind, id } => {
                backend.set_pipeline(res.pipeline_of(id, kind)?)?;
            }
            Command::SetBindGroup { slot, id } => {
                backend.set_bind_group(slot, res.bind_groups.get(id)?)?;
            }
            Command::SetVertexBuffer { slot, id } => {
                backend.set_vertex_buffer(slot, &res.buffer(id)?.handle)?;
            }
            Command::SetIndexBuffer { id, format } => {
                backend.set_index_buffer(&res.buffer(id)?.handle, format)?;
            }
            Command::Draw(args) => backend.draw(args)?,
            Command::DrawIndexed(args) => backend.draw_indexed(args)?,
            Command::Dispatch { x, y, z } => backend.dispatch(x, y, z)?,
            Command::EndPass => backend.end_pass()?,
            Command::WriteBuffer { id, offset, data } => {
                let slot = res.buffer(id)?;
                slot.check_write(id, offset, data.len())?;
                backend.write_buffer(&slot.handle, offset, data)?;
            }
            Command::Submit => backend.submit()?,
        }
        Ok(())
    }
}

/// Replay one self-contained command buffer into `backend`.
pub fn replay<B: Backend>(bytes: &[u8], backend: &mut B) -> Result<ReplayStats, ReplayError> {
    Replayer::new().replay(bytes, backend)
}
