use std::path::PathBuf;

use pngine_container::embed;

use super::CliError;
use super::input::{self, InputKind};

pub struct EmbedArgs {
    pub image: PathBuf,
    pub module: PathBuf,
    pub output: PathBuf,
    pub runtime: Option<PathBuf>,
}

pub fn run(args: EmbedArgs) -> Result<(), CliError> {
    let png = input::read_file(&args.image)?;
    let loaded = input::load(&args.module)?;
    if matches!(loaded.kind, InputKind::Png | InputKind::Bundle) {
        tracing::debug!(source = %args.module.display(), "re-embedding a packaged module");
    }

    let runtime = match &args.runtime {
        Some(path) => Some(input::read_file(path)?),
        None => loaded.runtime,
    };
    let out = embed(&png, &loaded.bytes, runtime.as_deref())?;
    input::write_file(&args.output, &out)
}
