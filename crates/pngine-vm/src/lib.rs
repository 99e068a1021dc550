#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Runtime for PNGine modules.
//!
//! - [`engine`]: the bytecode dispatcher and the [`Backend`] contract
//! - [`backends`]: a validating no-op backend and a command-buffer recorder
//! - [`command`]: the command-buffer format, reader and replay
//! - [`session`]: the host-facing query and render surface

pub mod backends;
pub mod command;
pub mod engine;
pub mod session;


pub use backends::{Call, NoopBackend, RecordingBackend};
pub use command::{Command, CommandError, CommandReader, ReplayError, Replayer, replay};
pub use engine::{
    Backend, BackendError, DispatchError, Dispatcher, Limits, NoopTracer, PrintTracer,
    RuntimeError, RuntimeInputs, Step, Tracer, Verbosity,
};
pub use session::{HostError, Rendered, Session, UniformInfo};
