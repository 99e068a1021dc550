//! Zip bundles.
//!
//! A bundle holds `manifest.json`, an entry module, an optional runtime and
//! any number of `assets/` files. Files are written in name order with a
//! fixed timestamp, so equal bundles produce equal archives.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};

use pngine_bytecode::Module;
use serde::{Deserialize, Serialize};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::ContainerError;

pub const MANIFEST_NAME: &str = "manifest.json";
pub const MANIFEST_VERSION: u32 = 1;
pub const DEFAULT_ENTRY: &str = "main.pngb";
pub const ASSET_DIR: &str = "assets/";
const MODULE_EXT: &str = ".pngb";
/// Largest member [`Bundle::read`] will inflate.
pub const MAX_FILE_SIZE: u64 = 64 << 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub entry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bundle {
    manifest: Option<Manifest>,
    files: BTreeMap<String, Vec<u8>>,
}

impl Bundle {
    /// A bundle whose manifest names `entry` as the module to run.
    pub fn new(entry: impl Into<String>, module: Vec<u8>) -> Self {
        let entry = entry.into();
        let mut files = BTreeMap::new();
        files.insert(entry.clone(), module);
        Self {
            manifest: Some(Manifest {
                version: MANIFEST_VERSION,
                entry,
                runtime: None,
            }),
            files,
        }
    }

    pub fn with_runtime(mut self, name: impl Into<String>, runtime: Vec<u8>) -> Self {
        let name = name.into();
        if let Some(manifest) = &mut self.manifest {
            manifest.runtime = Some(name.clone());
        }
        self.files.insert(name, runtime);
        self
    }

    /// Store `bytes` as `assets/<name>`.
    pub fn add_asset(&mut self, name: &str, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(format!("{ASSET_DIR}{name}"), bytes);
        self
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// All files except the manifest, in name order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    /// Resolve the entry module: the manifest entry, else `main.pngb`, else
    /// the only `.pngb` file outside `assets/`.
    pub fn entry_name(&self) -> Result<&str, ContainerError> {
        if let Some(manifest) = &self.manifest {
            return match self.files.contains_key(&manifest.entry) {
                true => Ok(&manifest.entry),
                false => Err(ContainerError::MissingFile(manifest.entry.clone())),
            };
        }
        if self.files.contains_key(DEFAULT_ENTRY) {
            return Ok(DEFAULT_ENTRY);
        }

        let modules: Vec<&String> = self
            .files
            .keys()
            .filter(|name| name.ends_with(MODULE_EXT) && !name.starts_with(ASSET_DIR))
            .collect();
        match modules[..] {
            [] => Err(ContainerError::NoEntry),
            [only] => Ok(only),
            _ => Err(ContainerError::AmbiguousEntry(modules.len())),
        }
    }

    pub fn entry(&self) -> Result<&[u8], ContainerError> {
        let name = self.entry_name()?;
        self.file(name)
            .ok_or_else(|| ContainerError::MissingFile(name.to_owned()))
    }

    pub fn load_entry(&self) -> Result<Module, ContainerError> {
        Ok(Module::from_bytes(self.entry()?)?)
    }

    /// The runtime named by the manifest, if any.
    pub fn runtime(&self) -> Result<Option<&[u8]>, ContainerError> {
        let Some(name) = self.manifest.as_ref().and_then(|m| m.runtime.as_deref()) else {
            return Ok(None);
        };
        self.file(name)
            .map(Some)
            .ok_or_else(|| ContainerError::MissingFile(name.to_owned()))
    }

    pub fn read<R: Read + Seek>(reader: R) -> Result<Self, ContainerError> {
        Self::read_with_limit(reader, MAX_FILE_SIZE)
    }

    /// Like [`read`](Self::read), failing on any member that inflates past
    /// `limit` bytes.
    pub fn read_with_limit<R: Read + Seek>(reader: R, limit: u64) -> Result<Self, ContainerError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut bundle = Self::default();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_owned();
            let mut bytes = Vec::with_capacity(file.size().min(limit).min(1 << 20) as usize);
            (&mut file).take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
            if bytes.len() as u64 > limit {
                return Err(ContainerError::FileTooLarge { name, limit });
            }

            if name == MANIFEST_NAME {
                let manifest: Manifest = serde_json::from_slice(&bytes)?;
                if manifest.version != MANIFEST_VERSION {
                    return Err(ContainerError::ManifestVersion(manifest.version));
                }
                bundle.manifest = Some(manifest);
            } else {
                bundle.files.insert(name, bytes);
            }
        }

        tracing::debug!(
            files = bundle.files.len(),
            manifest = bundle.manifest.is_some(),
            "read bundle"
        );
        Ok(bundle)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        Self::read(Cursor::new(bytes))
    }

    /// Write the archive and hand the writer back.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W, ContainerError> {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        let mut zip = ZipWriter::new(writer);

        if let Some(manifest) = &self.manifest {
            zip.start_file(MANIFEST_NAME, options)?;
            zip.write_all(&serde_json::to_vec(manifest)?)?;
        }
        for (name, bytes) in &self.files {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        tracing::debug!(files = self.files.len(), "wrote bundle");
        Ok(zip.finish()?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        Ok(self.write(Cursor::new(Vec::new()))?.into_inner())
    }
}
