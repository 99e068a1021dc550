//! Loading modules from any supported input.
//!
//! Inputs are told apart by their leading bytes; listings by extension.

use std::fs;
use std::path::Path;

use pngine_bytecode::bytecode::MAGIC;
use pngine_bytecode::{Assembler, Module};
use pngine_container::chunk::SIGNATURE;
use pngine_container::{Bundle, extract};

use super::CliError;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
const LISTING_EXT: &str = "pasm";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Module,
    Png,
    Bundle,
    Listing,
}

impl InputKind {
    pub fn detect(path: &Path, head: &[u8]) -> Option<Self> {
        if head.starts_with(&MAGIC) {
            Some(Self::Module)
        } else if head.starts_with(&SIGNATURE) {
            Some(Self::Png)
        } else if head.starts_with(&ZIP_MAGIC) {
            Some(Self::Bundle)
        } else if path.extension().is_some_and(|ext| ext == LISTING_EXT) {
            Some(Self::Listing)
        } else {
            None
        }
    }
}

/// A module together with the bytes it was stored as.
#[derive(Debug)]
pub struct Input {
    pub kind: InputKind,
    pub module: Module,
    /// Serialized module, exactly as found (or as assembled).
    pub bytes: Vec<u8>,
    /// Runtime packaged next to the module, if any.
    pub runtime: Option<Vec<u8>>,
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| CliError::io(path, e))
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|e| CliError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

pub fn load(path: &Path) -> Result<Input, CliError> {
    let raw = read_file(path)?;
    let kind = InputKind::detect(path, &raw).ok_or_else(|| CliError::UnknownInput(path.into()))?;
    tracing::debug!(path = %path.display(), ?kind, "loading input");

    let (bytes, runtime) = match kind {
        InputKind::Module => (raw, None),
        InputKind::Png => {
            let embedded = extract(&raw)?;
            (embedded.module, embedded.runtime)
        }
        InputKind::Bundle => {
            let bundle = Bundle::from_bytes(&raw)?;
            let runtime = bundle.runtime()?.map(<[u8]>::to_vec);
            (bundle.entry()?.to_vec(), runtime)
        }
        InputKind::Listing => {
            let text = String::from_utf8(raw).map_err(|e| {
                CliError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;
            let base = path.parent().unwrap_or(Path::new("."));
            let module = Assembler::new().with_base_dir(base).assemble(&text)?;
            let bytes = module.serialize()?;
            return Ok(Input {
                kind,
                module,
                bytes,
                runtime: None,
            });
        }
    };

    let module = Module::from_bytes(&bytes)?;
    Ok(Input {
        kind,
        module,
        bytes,
        runtime,
    })
}
