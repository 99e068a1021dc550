use std::path::PathBuf;

use super::CliError;
use super::input;

pub struct ExtractArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub runtime_out: Option<PathBuf>,
}

pub fn run(args: ExtractArgs) -> Result<(), CliError> {
    let loaded = input::load(&args.input)?;
    input::write_file(&args.output, &loaded.bytes)?;

    let Some(path) = &args.runtime_out else {
        return Ok(());
    };
    match &loaded.runtime {
        Some(runtime) => input::write_file(path, runtime),
        None => Err(CliError::Validation(format!(
            "{} carries no runtime",
            args.input.display()
        ))),
    }
}
