use std::fs;
use std::path::{Path, PathBuf};

use pngine_bytecode::Assembler;

use super::CliError;
use super::input;

pub struct CompileArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

pub fn run(args: CompileArgs) -> Result<(), CliError> {
    let text = fs::read_to_string(&args.input).map_err(|e| CliError::io(&args.input, e))?;
    let base = args.input.parent().unwrap_or(Path::new("."));
    let module = Assembler::new().with_base_dir(base).assemble(&text)?;
    let bytes = module.serialize()?;

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("pngb"));
    input::write_file(&output, &bytes)?;

    tracing::info!(output = %output.display(), bytes = bytes.len(), "compiled listing");
    Ok(())
}
