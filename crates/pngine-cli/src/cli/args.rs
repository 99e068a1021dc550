//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that commands compose. Ids are the
//! keys `dispatch.rs` reads back.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Module, PNG, bundle or `.pasm` listing (positional).
pub fn input_arg() -> Arg {
    Arg::new("input")
        .value_name("INPUT")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Module (.pngb), PNG, zip bundle or assembly listing (.pasm)")
}

/// Assembly listing (positional).
pub fn listing_arg() -> Arg {
    Arg::new("input")
        .value_name("LISTING")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Assembly listing (.pasm)")
}

/// PNG image (positional).
pub fn image_arg() -> Arg {
    Arg::new("image")
        .value_name("PNG")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("PNG image")
}

/// Write output to file (-o/--output).
pub fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write output to file")
}

/// Required output file (-o/--output).
pub fn required_output_arg() -> Arg {
    output_arg().required(true)
}

/// Runtime blob to package with the module (--runtime).
pub fn runtime_arg() -> Arg {
    Arg::new("runtime")
        .long("runtime")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Runtime (interpreter) to package alongside the module")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Verbosity level (-v, -vv). Global.
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .global(true)
        .help("Debug logging; validate also prints an execution trace (-vv: labeled operands)")
}

/// Output size (--width/--height).
pub fn width_arg() -> Arg {
    Arg::new("width")
        .long("width")
        .value_name("PX")
        .default_value("512")
        .value_parser(value_parser!(u32).range(1..=16384))
        .help("Output width in pixels")
}

pub fn height_arg() -> Arg {
    Arg::new("height")
        .long("height")
        .value_name("PX")
        .default_value("512")
        .value_parser(value_parser!(u32).range(1..=16384))
        .help("Output height in pixels")
}

/// Animation time in seconds (-t/--time).
pub fn time_arg() -> Arg {
    Arg::new("time")
        .short('t')
        .long("time")
        .value_name("SECONDS")
        .default_value("0")
        .value_parser(value_parser!(f32))
        .help("Animation time in seconds")
}

/// Named scene (--scene).
pub fn scene_arg() -> Arg {
    Arg::new("scene")
        .long("scene")
        .value_name("NAME")
        .conflicts_with("time")
        .help("Render the start of this scene instead of a time")
}

/// Skip embedding (--no-embed).
pub fn no_embed_arg() -> Arg {
    Arg::new("no_embed")
        .long("no-embed")
        .action(ArgAction::SetTrue)
        .help("Write the image without the module chunk")
}

/// Skip dispatch (--no-exec).
pub fn no_exec_arg() -> Arg {
    Arg::new("no_exec")
        .long("no-exec")
        .action(ArgAction::SetTrue)
        .help("Write the placeholder image without executing the module first")
}

/// Validation phase (--phase).
pub fn phase_arg() -> Arg {
    Arg::new("phase")
        .long("phase")
        .value_name("PHASE")
        .default_value("frames")
        .value_parser(["init", "frames"])
        .help("Last phase to run: init code only, or init plus frames")
}

/// Number of frames to record (--frames).
pub fn frames_arg() -> Arg {
    Arg::new("frames")
        .long("frames")
        .value_name("N")
        .default_value("1")
        .value_parser(value_parser!(u32).range(1..=10_000))
        .help("Record N frames and report which differ from the first")
}

/// Frame to run (--frame).
pub fn frame_arg() -> Arg {
    Arg::new("frame")
        .long("frame")
        .value_name("NAME")
        .help("Frame to validate (default: the first frame)")
}

/// Output compact JSON (--compact).
pub fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .action(ArgAction::SetTrue)
        .help("Output compact JSON")
}

/// Execution fuel limit (--fuel).
pub fn fuel_arg() -> Arg {
    Arg::new("fuel")
        .long("fuel")
        .value_name("N")
        .default_value("1000000")
        .value_parser(value_parser!(u32))
        .help("Execution fuel limit per run")
}

/// Bundle entry name (--entry).
pub fn entry_arg() -> Arg {
    Arg::new("entry")
        .long("entry")
        .value_name("NAME")
        .default_value("main.pngb")
        .help("Name of the entry module inside the bundle")
}

/// Extra bundle files (--asset, repeatable).
pub fn asset_arg() -> Arg {
    Arg::new("asset")
        .long("asset")
        .value_name("FILE")
        .action(ArgAction::Append)
        .value_parser(value_parser!(PathBuf))
        .help("File to store under assets/ (repeatable)")
}

/// Embedded module source (positional, second).
pub fn module_arg() -> Arg {
    Arg::new("module")
        .value_name("MODULE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Module (.pngb) or assembly listing (.pasm) to embed")
}

/// Where to write an extracted runtime (--runtime-out).
pub fn runtime_out_arg() -> Arg {
    Arg::new("runtime_out")
        .long("runtime-out")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Also write the packaged runtime to this file")
}
