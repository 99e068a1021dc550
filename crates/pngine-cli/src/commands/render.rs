//! Render a module into a PNG that carries it.
//!
//! No GPU backend ships with the CLI: the requested scene runs against the
//! validating backend, and the image written is a generated placeholder.

use std::path::PathBuf;

use pngine_bytecode::Module;
use pngine_container::{embed, placeholder};
use pngine_vm::{HostError, NoopBackend, Rendered, Session};

use super::CliError;
use super::input;

pub struct RenderArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub time: f32,
    pub scene: Option<String>,
    pub embed: bool,
    pub exec: bool,
    pub runtime: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let input::Input {
        module,
        bytes,
        runtime,
        ..
    } = input::load(&args.input)?;

    if args.exec {
        execute(module, &args)?;
    }

    let mut png = placeholder(args.width, args.height)?;
    if args.embed {
        let runtime = match &args.runtime {
            Some(path) => Some(input::read_file(path)?),
            None => runtime,
        };
        png = embed(&png, &bytes, runtime.as_deref())?;
    }
    input::write_file(&args.output, &png)
}

fn execute(module: Module, args: &RenderArgs) -> Result<Rendered, CliError> {
    let mut session = Session::new(NoopBackend::new(args.width, args.height));
    session.load_module(module)?;

    let time = match &args.scene {
        Some(name) => scene_start(&session, name)?,
        None => args.time,
    };
    let rendered = session.render(time)?;
    match rendered {
        Rendered::Nothing => tracing::warn!(time, "no scene covers this time"),
        _ => tracing::info!(time, ?rendered, "rendered"),
    }
    Ok(rendered)
}

fn scene_start(session: &Session<NoopBackend>, name: &str) -> Result<f32, CliError> {
    for index in 0..session.scene_count()? {
        if session.scene_name(index)? == name {
            return Ok(session.scene_time_range(index)?.0);
        }
    }
    Err(HostError::NotFound {
        what: "scene",
        name: name.to_owned(),
    }
    .into())
}
