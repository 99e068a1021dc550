#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Packaging for PNGine modules.
//!
//! - [`chunk`]: store a module (and optional runtime) in ancillary chunks of
//!   an ordinary PNG file
//! - [`bundle`]: a zip archive with a manifest, an entry module, an optional
//!   runtime and assets
//! - [`placeholder`]: a small generated PNG to carry a module when no
//!   rendered image is available

pub mod bundle;
pub mod chunk;
mod error;
pub mod placeholder;

#[cfg(test)]
mod chunk_tests;

pub use bundle::{Bundle, MANIFEST_NAME, Manifest};
pub use chunk::{
    Chunk, Chunks, Embedded, MODULE_CHUNK, RUNTIME_CHUNK, embed, extract, has_module, image_size,
};
pub use error::ContainerError;
pub use placeholder::placeholder;
