use std::path::PathBuf;

use pngine_container::Bundle;

use super::CliError;
use super::input;

pub struct BundleArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub entry: String,
    pub runtime: Option<PathBuf>,
    pub assets: Vec<PathBuf>,
}

pub fn run(args: BundleArgs) -> Result<(), CliError> {
    let loaded = input::load(&args.input)?;

    let mut bundle = Bundle::new(args.entry, loaded.bytes);
    if let Some(path) = &args.runtime {
        let name = file_name(path)?;
        bundle = bundle.with_runtime(name, input::read_file(path)?);
    } else if let Some(runtime) = loaded.runtime {
        bundle = bundle.with_runtime("runtime.wasm", runtime);
    }
    for path in &args.assets {
        let name = file_name(path)?;
        bundle.add_asset(&name, input::read_file(path)?);
    }

    let bytes = bundle.to_bytes()?;
    input::write_file(&args.output, &bytes)
}

fn file_name(path: &std::path::Path) -> Result<String, CliError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CliError::Validation(format!("{}: not a file name", path.display())))
}
