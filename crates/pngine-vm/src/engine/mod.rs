//! Dispatch engine for PNGine bytecode.
//!
//! The dispatcher decodes one instruction at a time and drives a
//! [`Backend`] with fully resolved arguments. Resources live in a
//! [`ResourceTable`] keyed by compiler-assigned IDs.

mod backend;
mod context;
mod datagen;
mod error;
mod frame;
mod resources;
mod trace;
mod vm;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod frame_tests;

pub use backend::{
    Backend, BackendError, BindGroupEntry, BindResource, BufferDesc, ColorTarget, DrawArgs,
    DrawIndexedArgs, PipelineKind, PipelineRef, RenderPipelineDesc,
};
pub use context::{Context, PassKind};
pub use datagen::{DataGenError, FillRange, TypedArray};
pub use error::{DispatchError, RuntimeError};
pub use frame::{FrameIndex, FrameSpan, PassSpan};
pub use resources::{
    BufferSlot, PipelineSlot, ResourceError, ResourceKind, ResourceTable, Slots,
};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use vm::{Dispatcher, Limits, RuntimeInputs, Step};
