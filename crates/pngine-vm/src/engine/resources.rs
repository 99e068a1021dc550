//! Resource table: compiler-assigned IDs to backend handles.
//!
//! One dense table per resource kind. IDs are assigned by the compiler,
//! so slots are created on demand up to a configured ceiling.

use std::fmt;

use super::backend::{Backend, PipelineKind, PipelineRef};
use super::datagen::TypedArray;
use super::error::RuntimeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    ShaderModule,
    Pipeline,
    BindGroup,
    TypedArray,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buffer => "buffer",
            Self::Texture => "texture",
            Self::Sampler => "sampler",
            Self::ShaderModule => "shader module",
            Self::Pipeline => "pipeline",
            Self::BindGroup => "bind group",
            Self::TypedArray => "typed array",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("{kind} {id} has not been created")]
    NotCreated { kind: ResourceKind, id: u32 },
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: ResourceKind, id: u32 },
    #[error("{kind} id {id} exceeds the limit of {limit}")]
    IdTooLarge {
        kind: ResourceKind,
        id: u32,
        limit: u32,
    },
    #[error("pipeline {id} is a {actual} pipeline, expected {expected}")]
    WrongPipelineKind {
        id: u32,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Dense ID-indexed slots for one resource kind.
#[derive(Debug)]
pub struct Slots<T> {
    kind: ResourceKind,
    items: Vec<Option<T>>,
    live: usize,
}

impl<T> Slots<T> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            live: 0,
        }
    }

    /// Fail unless `id` is free and within `limit`.
    pub fn check_free(&self, id: u32, limit: u32) -> Result<(), ResourceError> {
        if id > limit {
            return Err(ResourceError::IdTooLarge {
                kind: self.kind,
                id,
                limit,
            });
        }
        if self.contains(id) {
            return Err(ResourceError::AlreadyExists {
                kind: self.kind,
                id,
            });
        }
        Ok(())
    }

    pub fn insert(&mut self, id: u32, item: T, limit: u32) -> Result<(), ResourceError> {
        self.check_free(id, limit)?;
        let idx = id as usize;
        if idx >= self.items.len() {
            self.items.resize_with(idx + 1, || None);
        }
        self.items[idx] = Some(item);
        self.live += 1;
        Ok(())
    }

    pub fn contains(&self, id: u32) -> bool {
        matches!(self.items.get(id as usize), Some(Some(_)))
    }

    pub fn get(&self, id: u32) -> Result<&T, ResourceError> {
        self.items
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or(ResourceError::NotCreated {
                kind: self.kind,
                id,
            })
    }

    pub fn get_mut(&mut self, id: u32) -> Result<&mut T, ResourceError> {
        let kind = self.kind;
        self.items
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(ResourceError::NotCreated { kind, id })
    }

    /// Number of created resources.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.live = 0;
    }
}

/// A created buffer and its size in bytes.
#[derive(Debug)]
pub struct BufferSlot<H> {
    pub handle: H,
    pub size: u32,
}

impl<H> BufferSlot<H> {
    /// Fails when `len` bytes at `offset` run past the end of buffer `id`.
    pub fn check_write(&self, id: u32, offset: u32, len: usize) -> Result<(), RuntimeError> {
        if u64::from(offset) + len as u64 > u64::from(self.size) {
            return Err(RuntimeError::OutOfBounds {
                buffer: id,
                offset,
                len,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Byte length of a binding window. A `size` of 0 binds the rest of the
    /// buffer; an empty or overhanging window is rejected.
    pub fn bind_size(&self, id: u32, offset: u32, size: u32) -> Result<u32, RuntimeError> {
        let size = if size == 0 {
            self.size.saturating_sub(offset)
        } else {
            size
        };
        if size == 0 || u64::from(offset) + u64::from(size) > u64::from(self.size) {
            return Err(RuntimeError::OutOfBounds {
                buffer: id,
                offset,
                len: size as usize,
                size: self.size,
            });
        }
        Ok(size)
    }
}

#[derive(Debug)]
pub enum PipelineSlot<R, C> {
    Render(R),
    Compute(C),
}

impl<R, C> PipelineSlot<R, C> {
    pub fn kind(&self) -> PipelineKind {
        match self {
            Self::Render(_) => PipelineKind::Render,
            Self::Compute(_) => PipelineKind::Compute,
        }
    }
}

/// All resources created by a module, keyed by ID.
pub struct ResourceTable<B: Backend> {
    pub buffers: Slots<BufferSlot<B::Buffer>>,
    pub textures: Slots<B::Texture>,
    pub samplers: Slots<B::Sampler>,
    pub shaders: Slots<B::ShaderModule>,
    pub pipelines: Slots<PipelineSlot<B::RenderPipeline, B::ComputePipeline>>,
    pub bind_groups: Slots<B::BindGroup>,
    pub arrays: Slots<TypedArray>,
}

impl<B: Backend> Default for ResourceTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> ResourceTable<B> {
    pub fn new() -> Self {
        Self {
            buffers: Slots::new(ResourceKind::Buffer),
            textures: Slots::new(ResourceKind::Texture),
            samplers: Slots::new(ResourceKind::Sampler),
            shaders: Slots::new(ResourceKind::ShaderModule),
            pipelines: Slots::new(ResourceKind::Pipeline),
            bind_groups: Slots::new(ResourceKind::BindGroup),
            arrays: Slots::new(ResourceKind::TypedArray),
        }
    }

    pub fn buffer(&self, id: u32) -> Result<&BufferSlot<B::Buffer>, ResourceError> {
        self.buffers.get(id)
    }

    pub fn pipeline(&self, id: u32) -> Result<PipelineRef<'_, B>, ResourceError> {
        Ok(match self.pipelines.get(id)? {
            PipelineSlot::Render(p) => PipelineRef::Render(p),
            PipelineSlot::Compute(p) => PipelineRef::Compute(p),
        })
    }

    /// Pipeline `id`, which must be of `kind`.
    pub fn pipeline_of(
        &self,
        id: u32,
        kind: PipelineKind,
    ) -> Result<PipelineRef<'_, B>, ResourceError> {
        let pipeline = self.pipeline(id)?;
        if pipeline.kind() != kind {
            return Err(ResourceError::WrongPipelineKind {
                id,
                expected: kind.name(),
                actual: pipeline.kind().name(),
            });
        }
        Ok(pipeline)
    }

    /// Total number of live resources across all kinds.
    pub fn len(&self) -> usize {
        self.buffers.len()
            + self.textures.len()
            + self.samplers.len()
            + self.shaders.len()
            + self.pipelines.len()
            + self.bind_groups.len()
            + self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
        self.textures.clear();
        self.samplers.clear();
        self.shaders.clear();
        self.pipelines.clear();
        self.bind_groups.clear();
        self.arrays.clear();
    }
}
