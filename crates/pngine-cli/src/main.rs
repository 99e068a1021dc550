mod cli;
mod commands;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use cli::{
    BundleParams, CheckParams, CompileParams, DumpParams, EmbedParams, ExtractParams, ListParams,
    RenderParams, ValidateParams, build_cli,
};

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("PNGINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    let Some((name, m)) = matches.subcommand() else {
        unreachable!("clap should have caught this")
    };
    init_logging(m.get_count("verbose"));

    let result = match name {
        "compile" => commands::compile::run(CompileParams::from_matches(m).into()),
        "render" => commands::render::run(RenderParams::from_matches(m).into()),
        "validate" => commands::validate::run(ValidateParams::from_matches(m).into()),
        "check" => commands::check::run(CheckParams::from_matches(m).into()),
        "dump" => commands::dump::run(DumpParams::from_matches(m).into()),
        "bundle" => commands::bundle::run(BundleParams::from_matches(m).into()),
        "list" => commands::list::run(ListParams::from_matches(m).into()),
        "embed" => commands::embed::run(EmbedParams::from_matches(m).into()),
        "extract" => commands::extract::run(ExtractParams::from_matches(m).into()),
        _ => unreachable!("clap should have caught this"),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
