use std::io;
use std::path::PathBuf;

use pngine_bytecode::{AsmError, ModuleError};
use pngine_container::ContainerError;
use pngine_vm::{DispatchError, HostError};

/// Command failure, mapped to the process exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Validation(String),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: not a module, PNG, zip bundle or .pasm listing", .0.display())]
    UnknownInput(PathBuf),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Assemble(#[from] AsmError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("cannot write report: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 1,
            Self::Io { .. } | Self::Json(_) | Self::Container(ContainerError::Io(_)) => 3,
            Self::UnknownInput(_) | Self::Module(_) | Self::Container(_) => 4,
            Self::Host(HostError::Module(_)) => 4,
            Self::Assemble(_) => 5,
            Self::Dispatch(_) | Self::Host(_) => 6,
        }
    }
}
