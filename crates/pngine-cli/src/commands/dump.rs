use std::path::PathBuf;

use pngine_bytecode::dump;
use pngine_core::Colors;

use super::CliError;
use super::input;

pub struct DumpArgs {
    pub input: PathBuf,
    pub color: bool,
}

pub fn run(args: DumpArgs) -> Result<(), CliError> {
    let loaded = input::load(&args.input)?;
    print!("{}", dump(&loaded.module, Colors::new(args.color)));
    Ok(())
}
