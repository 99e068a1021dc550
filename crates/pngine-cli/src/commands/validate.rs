//! Execute a module against the recording backend and report as JSON.
//!
//! Phases run in order and stop at the first failure. With `--frames N`
//! the selected frame is recorded N times at 60 Hz steps, and each
//! recording is compared with the first one.

use std::path::PathBuf;

use pngine_bytecode::Module;
use pngine_core::Colors;
use pngine_vm::{
    CommandReader, DispatchError, Dispatcher, Limits, PrintTracer, RecordingBackend, Verbosity,
};
use serde::Serialize;

use super::CliError;
use super::input;

const FRAME_STEP: f32 = 1.0 / 60.0;

pub struct ValidateArgs {
    pub input: PathBuf,
    pub phase: Phase,
    pub frames: u32,
    pub frame: Option<String>,
    pub fuel: u32,
    pub compact: bool,
    pub trace: Option<Verbosity>,
    pub color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    Frames,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub valid: bool,
    pub module: ModuleSummary,
    pub phases: Vec<PhaseReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameReport>,
}

#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub version: u16,
    pub bytecode: usize,
    pub capabilities: Vec<&'static str>,
    pub frames: usize,
    pub uniforms: usize,
    pub scenes: usize,
}

#[derive(Debug, Serialize)]
pub struct PhaseReport {
    pub phase: &'static str,
    pub ok: bool,
    pub commands: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opcode: Option<&'static str>,
}

impl From<&DispatchError> for ErrorReport {
    fn from(e: &DispatchError) -> Self {
        Self {
            message: e.kind.to_string(),
            offset: Some(e.offset),
            opcode: e.opcode.map(|op| op.mnemonic()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub index: u32,
    pub time: f32,
    pub commands: usize,
    pub bytes: usize,
    pub differs: bool,
}

pub struct Options {
    pub phase: Phase,
    pub frames: u32,
    pub frame: Option<String>,
    pub limits: Limits,
    pub trace: Option<Verbosity>,
    pub colors: Colors,
}

pub fn run(args: ValidateArgs) -> Result<(), CliError> {
    let loaded = input::load(&args.input)?;
    let options = Options {
        phase: args.phase,
        frames: args.frames,
        frame: args.frame,
        limits: Limits::default().with_exec_fuel(args.fuel),
        trace: args.trace,
        colors: Colors::new(args.color),
    };

    let (report, trace) = validate(loaded.module, &options);
    for line in &trace {
        eprintln!("{line}");
    }

    let json = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");

    if !report.valid {
        return Err(CliError::Validation("validation failed".into()));
    }
    Ok(())
}

fn commands(bytes: &[u8]) -> usize {
    CommandReader::new(bytes).map_or(0, |r| usize::from(r.declared_count()))
}

/// Run the requested phases and collect a report plus trace lines.
pub fn validate(module: Module, options: &Options) -> (Report, Vec<String>) {
    let mut tracer = options
        .trace
        .map(|verbosity| PrintTracer::new(&module, verbosity, options.colors));
    let mut summary = ModuleSummary {
        version: module.version(),
        bytecode: module.bytecode().len(),
        capabilities: module.capabilities().names().collect(),
        frames: 0,
        uniforms: module.uniforms().len(),
        scenes: module.animation().map_or(0, |a| a.scenes.len()),
    };

    let mut d = Dispatcher::with_limits(module, RecordingBackend::default(), options.limits);
    summary.frames = d.frame_count();

    let mut phases = Vec::new();
    let mut frames = Vec::new();
    run_phases(&mut d, options, tracer.as_mut(), &mut phases, &mut frames);

    let report = Report {
        valid: phases.iter().all(|p| p.ok),
        module: summary,
        phases,
        frames,
    };
    let trace = tracer.map(PrintTracer::into_lines).unwrap_or_default();
    (report, trace)
}

fn run_phases(
    d: &mut Dispatcher<RecordingBackend>,
    options: &Options,
    mut tracer: Option<&mut PrintTracer>,
    phases: &mut Vec<PhaseReport>,
    frames: &mut Vec<FrameReport>,
) {
    let result = match tracer.as_deref_mut() {
        Some(t) => d.execute_init_with(t),
        None => d.execute_init(),
    };
    let setup = d.backend_mut().take();
    let init_ok = result.is_ok();
    phases.push(PhaseReport {
        phase: "init",
        ok: init_ok,
        commands: commands(&setup),
        error: result.as_ref().err().map(ErrorReport::from),
    });
    if !init_ok || options.phase == Phase::Init {
        return;
    }

    let index = match &options.frame {
        None => 0,
        Some(name) => match find_frame(d, name) {
            Some(index) => index,
            None => {
                phases.push(PhaseReport {
                    phase: "frames",
                    ok: false,
                    commands: 0,
                    error: Some(ErrorReport {
                        message: format!("frame `{name}` not found"),
                        offset: None,
                        opcode: None,
                    }),
                });
                return;
            }
        },
    };
    if d.frame_count() == 0 {
        phases.push(PhaseReport {
            phase: "frames",
            ok: true,
            commands: 0,
            error: None,
        });
        return;
    }

    let mut first: Option<Vec<u8>> = None;
    let mut total = 0;
    let mut error = None;
    for i in 0..options.frames {
        let time = i as f32 * FRAME_STEP;
        d.set_time(time);
        let result = match tracer.as_deref_mut() {
            Some(t) => d.execute_frame_with(index, t),
            None => d.execute_frame(index),
        };
        let bytes = d.backend_mut().take();
        if let Err(e) = result {
            tracing::warn!(frame = i, error = %e, "frame aborted");
            error = Some(ErrorReport::from(&e));
            break;
        }

        let count = commands(&bytes);
        total += count;
        frames.push(FrameReport {
            index: i,
            time,
            commands: count,
            bytes: bytes.len(),
            differs: first.as_ref().is_some_and(|f| *f != bytes),
        });
        first.get_or_insert(bytes);
    }

    phases.push(PhaseReport {
        phase: "frames",
        ok: error.is_none(),
        commands: total,
        error,
    });
}

fn find_frame(d: &mut Dispatcher<RecordingBackend>, name: &str) -> Option<usize> {
    let count = d.frame_count();
    (0..count).find(|&i| d.frame_name(i).as_deref() == Some(name))
}
