//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! - `*Params` structs mirror the command `*Args` but are populated from clap
//! - `from_matches()` pulls the fields a command uses
//! - `Into<*Args>` impls bridge dispatch to the command handlers

use std::path::PathBuf;

use clap::ArgMatches;
use pngine_vm::Verbosity;

use super::ColorChoice;
use crate::commands::bundle::BundleArgs;
use crate::commands::check::CheckArgs;
use crate::commands::compile::CompileArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::embed::EmbedArgs;
use crate::commands::extract::ExtractArgs;
use crate::commands::list::ListArgs;
use crate::commands::render::RenderArgs;
use crate::commands::validate::{Phase, ValidateArgs};

fn path(m: &ArgMatches, id: &str) -> PathBuf {
    m.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    ColorChoice::parse(m.get_one::<String>("color").map(String::as_str))
}

pub struct CompileParams {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

impl CompileParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
            output: m.get_one::<PathBuf>("output").cloned(),
        }
    }
}

impl From<CompileParams> for CompileArgs {
    fn from(p: CompileParams) -> Self {
        Self {
            input: p.input,
            output: p.output,
        }
    }
}

pub struct RenderParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub time: f32,
    pub scene: Option<String>,
    pub no_embed: bool,
    pub no_exec: bool,
    pub runtime: Option<PathBuf>,
}

impl RenderParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
            output: path(m, "output"),
            width: m.get_one::<u32>("width").copied().unwrap_or(512),
            height: m.get_one::<u32>("height").copied().unwrap_or(512),
            time: m.get_one::<f32>("time").copied().unwrap_or(0.0),
            scene: m.get_one::<String>("scene").cloned(),
            no_embed: m.get_flag("no_embed"),
            no_exec: m.get_flag("no_exec"),
            runtime: m.get_one::<PathBuf>("runtime").cloned(),
        }
    }
}

impl From<RenderParams> for RenderArgs {
    fn from(p: RenderParams) -> Self {
        Self {
            input: p.input,
            output: p.output,
            width: p.width,
            height: p.height,
            time: p.time,
            scene: p.scene,
            embed: !p.no_embed,
            exec: !p.no_exec,
            runtime: p.runtime,
        }
    }
}

pub struct ValidateParams {
    pub input: PathBuf,
    pub phase: Phase,
    pub frames: u32,
    pub frame: Option<String>,
    pub fuel: u32,
    pub compact: bool,
    pub verbose: u8,
    pub color: ColorChoice,
}

impl ValidateParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        let phase = match m.get_one::<String>("phase").map(String::as_str) {
            Some("init") => Phase::Init,
            _ => Phase::Frames,
        };
        Self {
            input: path(m, "input"),
            phase,
            frames: m.get_one::<u32>("frames").copied().unwrap_or(1),
            frame: m.get_one::<String>("frame").cloned(),
            fuel: m.get_one::<u32>("fuel").copied().unwrap_or(1_000_000),
            compact: m.get_flag("compact"),
            verbose: m.get_count("verbose"),
            color: parse_color(m),
        }
    }
}

impl From<ValidateParams> for ValidateArgs {
    fn from(p: ValidateParams) -> Self {
        let trace = match p.verbose {
            0 => None,
            1 => Some(Verbosity::Default),
            _ => Some(Verbosity::Verbose),
        };
        Self {
            input: p.input,
            phase: p.phase,
            frames: p.frames,
            frame: p.frame,
            fuel: p.fuel,
            compact: p.compact,
            trace,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CheckParams {
    pub input: PathBuf,
    pub fuel: u32,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
            fuel: m.get_one::<u32>("fuel").copied().unwrap_or(1_000_000),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            input: p.input,
            fuel: p.fuel,
        }
    }
}

pub struct DumpParams {
    pub input: PathBuf,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            input: p.input,
            color: p.color.should_colorize(),
        }
    }
}

pub struct BundleParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub entry: String,
    pub runtime: Option<PathBuf>,
    pub assets: Vec<PathBuf>,
}

impl BundleParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
            output: path(m, "output"),
            entry: m
                .get_one::<String>("entry")
                .cloned()
                .unwrap_or_else(|| "main.pngb".into()),
            runtime: m.get_one::<PathBuf>("runtime").cloned(),
            assets: m
                .get_many::<PathBuf>("asset")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
        }
    }
}

impl From<BundleParams> for BundleArgs {
    fn from(p: BundleParams) -> Self {
        Self {
            input: p.input,
            output: p.output,
            entry: p.entry,
            runtime: p.runtime,
            assets: p.assets,
        }
    }
}

pub struct ListParams {
    pub input: PathBuf,
}

impl ListParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
        }
    }
}

impl From<ListParams> for ListArgs {
    fn from(p: ListParams) -> Self {
        Self { input: p.input }
    }
}

pub struct EmbedParams {
    pub image: PathBuf,
    pub module: PathBuf,
    pub output: PathBuf,
    pub runtime: Option<PathBuf>,
}

impl EmbedParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            image: path(m, "image"),
            module: path(m, "module"),
            output: path(m, "output"),
            runtime: m.get_one::<PathBuf>("runtime").cloned(),
        }
    }
}

impl From<EmbedParams> for EmbedArgs {
    fn from(p: EmbedParams) -> Self {
        Self {
            image: p.image,
            module: p.module,
            output: p.output,
            runtime: p.runtime,
        }
    }
}

pub struct ExtractParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub runtime_out: Option<PathBuf>,
}

impl ExtractParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: path(m, "input"),
            output: path(m, "output"),
            runtime_out: m.get_one::<PathBuf>("runtime_out").cloned(),
        }
    }
}

impl From<ExtractParams> for ExtractArgs {
    fn from(p: ExtractParams) -> Self {
        Self {
            input: p.input,
            output: p.output,
            runtime_out: p.runtime_out,
        }
    }
}
