use std::path::PathBuf;

use pngine_bytecode::{Capabilities, Module};
use pngine_vm::{Dispatcher, Limits, NoopBackend};

use super::CliError;
use super::input;

pub struct CheckArgs {
    pub input: PathBuf,
    pub fuel: u32,
}

pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let loaded = input::load(&args.input)?;
    check(loaded.module, Limits::default().with_exec_fuel(args.fuel))
    // Silent on success
}

/// Verify declared capabilities, then run every instruction once.
pub fn check(module: Module, limits: Limits) -> Result<(), CliError> {
    let used = Capabilities::scan(module.bytecode()).map_err(|e| {
        CliError::Validation(format!("bytecode does not decode: {e}"))
    })?;
    let declared = module.capabilities();

    let missing = Capabilities(used.bits() & !declared.bits());
    if !missing.is_empty() {
        let names: Vec<&str> = missing.names().collect();
        return Err(CliError::Validation(format!(
            "bytecode uses undeclared capabilities: {}",
            names.join(", ")
        )));
    }
    let unused = Capabilities(declared.bits() & !used.bits() & !Capabilities::ANIMATION.bits());
    if !unused.is_empty() {
        let names: Vec<&str> = unused.names().collect();
        tracing::warn!(capabilities = %names.join(", "), "declared but unused");
    }

    let mut dispatcher = Dispatcher::with_limits(module, NoopBackend::default(), limits);
    dispatcher.execute_all()?;
    tracing::debug!(
        calls = dispatcher.backend().calls().len(),
        frames = dispatcher.frame_counter(),
        "check passed"
    );
    Ok(())
}
