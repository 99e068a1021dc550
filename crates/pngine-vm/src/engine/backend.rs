//! Backend contract.
//!
//! The dispatcher resolves every operand (IDs to handles, data entries to
//! parsed descriptors, string IDs to text) before calling into the backend,
//! so implementations never see raw bytecode. Resource IDs are passed to the
//! `create_*` calls for backends that record or log; live backends may
//! ignore them.

use pngine_bytecode::bytecode::{
    BindingKind, IndexFormat, LoadOp, PrimitiveTopology, SamplerDescriptor, StoreOp,
    TextureDescriptor, TextureFormat,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("invalid call: {0}")]
    Invalid(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("command limit of {0} records exceeded")]
    TooManyCommands(usize),
    #[error("device lost")]
    DeviceLost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u32,
    pub usage: u8,
}

/// Render pipeline creation parameters with entry points resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderPipelineDesc<'a> {
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub topology: PrimitiveTopology,
    pub format: TextureFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawIndexedArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: u32,
    pub first_instance: u32,
}

/// Which kind of pipeline a reference or slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Render,
    Compute,
}

impl PipelineKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Compute => "compute",
        }
    }
}

/// Borrowed pipeline handle of either kind.
pub enum PipelineRef<'a, B: Backend + ?Sized> {
    Render(&'a B::RenderPipeline),
    Compute(&'a B::ComputePipeline),
}

impl<B: Backend + ?Sized> PipelineRef<'_, B> {
    pub fn kind(&self) -> PipelineKind {
        match self {
            Self::Render(_) => PipelineKind::Render,
            Self::Compute(_) => PipelineKind::Compute,
        }
    }
}

/// Color attachment of a render pass.
pub enum ColorTarget<'a, T> {
    /// The backend's default output surface.
    Default,
    Texture(&'a T),
}

/// One resolved bind-group entry.
pub struct BindGroupEntry<'a, B: Backend + ?Sized> {
    pub binding: u32,
    pub resource: BindResource<'a, B>,
}

pub enum BindResource<'a, B: Backend + ?Sized> {
    /// `size` is already resolved; it is never 0.
    Buffer {
        buffer: &'a B::Buffer,
        kind: BindingKind,
        offset: u32,
        size: u32,
    },
    Texture(&'a B::Texture),
    Sampler(&'a B::Sampler),
}

/// A graphics-API-shaped execution target.
pub trait Backend {
    type Buffer;
    type Texture;
    type Sampler;
    type ShaderModule;
    type RenderPipeline;
    type ComputePipeline;
    type BindGroup;

    fn create_buffer(&mut self, id: u32, desc: &BufferDesc) -> Result<Self::Buffer, BackendError>;

    fn create_texture(
        &mut self,
        id: u32,
        desc: &TextureDescriptor,
    ) -> Result<Self::Texture, BackendError>;

    fn create_sampler(
        &mut self,
        id: u32,
        desc: &SamplerDescriptor,
    ) -> Result<Self::Sampler, BackendError>;

    fn create_shader_module(
        &mut self,
        id: u32,
        code: &str,
    ) -> Result<Self::ShaderModule, BackendError>;

    fn create_render_pipeline(
        &mut self,
        id: u32,
        shader: &Self::ShaderModule,
        desc: &RenderPipelineDesc<'_>,
    ) -> Result<Self::RenderPipeline, BackendError>;

    fn create_compute_pipeline(
        &mut self,
        id: u32,
        shader: &Self::ShaderModule,
        entry: &str,
    ) -> Result<Self::ComputePipeline, BackendError>;

    /// Create a bind group against layout `index` of `layout`.
    fn create_bind_group(
        &mut self,
        id: u32,
        layout: PipelineRef<'_, Self>,
        index: u8,
        entries: &[BindGroupEntry<'_, Self>],
    ) -> Result<Self::BindGroup, BackendError>;

    fn begin_render_pass(
        &mut self,
        color: ColorTarget<'_, Self::Texture>,
        load: LoadOp,
        store: StoreOp,
        depth: Option<&Self::Texture>,
    ) -> Result<(), BackendError>;

    fn begin_compute_pass(&mut self) -> Result<(), BackendError>;

    fn set_pipeline(&mut self, pipeline: PipelineRef<'_, Self>) -> Result<(), BackendError>;

    fn set_bind_group(&mut self, slot: u8, group: &Self::BindGroup) -> Result<(), BackendError>;

    fn set_vertex_buffer(&mut self, slot: u8, buffer: &Self::Buffer) -> Result<(), BackendError>;

    fn set_index_buffer(
        &mut self,
        buffer: &Self::Buffer,
        format: IndexFormat,
    ) -> Result<(), BackendError>;

    fn draw(&mut self, args: DrawArgs) -> Result<(), BackendError>;

    fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<(), BackendError>;

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), BackendError>;

    fn end_pass(&mut self) -> Result<(), BackendError>;

    fn write_buffer(
        &mut self,
        buffer: &Self::Buffer,
        offset: u32,
        data: &[u8],
    ) -> Result<(), BackendError>;

    fn submit(&mut self) -> Result<(), BackendError>;

    /// Dimensions of the default output target.
    fn output_size(&self) -> (u32, u32);
}
