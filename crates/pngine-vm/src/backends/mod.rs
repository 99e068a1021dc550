//! Backends shipped with the runtime.

mod noop;
mod recording;


pub use noop::{Call, NoopBackend};
pub use recording::RecordingBackend;
