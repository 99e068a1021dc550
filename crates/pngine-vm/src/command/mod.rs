//! Command buffers: a flat, replayable record of backend calls.
//!
//! Layout: an 8-byte header (`total_len u32`, `count u16`, `flags u16`)
//! followed by `count` records. A record is one command byte, fixed
//! little-endian `u32` fields, then any variable payloads, each prefixed
//! with its `u32` byte length.

mod format;
mod reader;
mod replay;


pub use format::{
    BindEntries, Cmd, Command, CommandWriter, HEADER_LEN, MAX_COMMANDS, flags, pipeline_kind_code,
};
pub use reader::{CommandError, CommandReader};
pub use replay::{ReplayError, ReplayStats, Replayer, replay};
