use pngine_bytecode::ModuleError;

/// Errors from reading or writing PNG files and bundles.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("not a PNG file")]
    NotPng,
    #[error("truncated chunk at offset {0}")]
    Truncated(usize),
    #[error("CRC mismatch in `{kind}` chunk at offset {offset}")]
    Crc { kind: String, offset: usize },
    #[error("PNG has no IEND chunk")]
    MissingEnd,
    #[error("chunk payload of {0} bytes exceeds the PNG limit")]
    ChunkTooLarge(usize),
    #[error("placeholder of {width}x{height} pixels is too large")]
    ImageTooLarge { width: u32, height: u32 },
    #[error("bundle member `{name}` exceeds {limit} bytes")]
    FileTooLarge { name: String, limit: u64 },
    #[error("no embedded module")]
    NoModule,
    #[error("bundle has no entry module")]
    NoEntry,
    #[error("bundle has {0} modules and no manifest entry")]
    AmbiguousEntry(usize),
    #[error("bundle is missing `{0}`")]
    MissingFile(String),
    #[error("unsupported manifest version {0}")]
    ManifestVersion(u32),
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("invalid module: {0}")]
    Module(#[from] ModuleError),
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("png encode: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("png decode: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
