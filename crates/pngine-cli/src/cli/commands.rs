//! Command builders for the CLI.
//!
//! Each command is built from the shared arg builders in `args.rs`.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("pngine")
        .about("Executable GPU scenes stored inside PNG files")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(compile_command())
        .subcommand(render_command())
        .subcommand(validate_command())
        .subcommand(check_command())
        .subcommand(dump_command())
        .subcommand(bundle_command())
        .subcommand(list_command())
        .subcommand(embed_command())
        .subcommand(extract_command())
        .after_help(
            r#"EXIT CODES:
  1  validation failed
  2  usage error
  3  I/O error
  4  invalid module, image or bundle
  5  assembly error
  6  execution error

Set PNGINE_LOG (e.g. PNGINE_LOG=pngine_vm=debug) to control logging."#,
        )
}

/// Assemble a listing into a module file.
pub fn compile_command() -> Command {
    Command::new("compile")
        .about("Assemble a .pasm listing into a module")
        .after_help(
            r#"EXAMPLES:
  pngine compile scene.pasm              # writes scene.pngb
  pngine compile scene.pasm -o out.pngb"#,
        )
        .arg(listing_arg())
        .arg(output_arg())
}

/// Produce a PNG carrying the module.
pub fn render_command() -> Command {
    Command::new("render")
        .about("Write a PNG that carries the module")
        .long_about(
            "Executes the scene at the requested time against the validating backend, \
             then writes a placeholder image with the module embedded.",
        )
        .after_help(
            r#"EXAMPLES:
  pngine render scene.pasm -o scene.png
  pngine render scene.pngb -o scene.png --scene intro
  pngine render scene.pngb -o plain.png --no-embed --width 64 --height 64"#,
        )
        .arg(input_arg())
        .arg(required_output_arg())
        .arg(width_arg())
        .arg(height_arg())
        .arg(time_arg())
        .arg(scene_arg())
        .arg(no_embed_arg())
        .arg(no_exec_arg())
        .arg(runtime_arg())
}

/// Structured pass/fail report.
pub fn validate_command() -> Command {
    Command::new("validate")
        .about("Execute a module and print a JSON report")
        .after_help(
            r#"EXAMPLES:
  pngine validate scene.pngb
  pngine validate scene.png --phase init
  pngine validate scene.pngb --frames 10     # diff 10 frames against the first
  pngine validate scene.pngb -v              # execution trace on stderr"#,
        )
        .arg(input_arg())
        .arg(phase_arg())
        .arg(frames_arg())
        .arg(frame_arg())
        .arg(fuel_arg())
        .arg(compact_arg())
        .arg(color_arg())
}

/// Structural and semantic checks.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Check a module against the validating backend")
        .after_help(
            r#"EXAMPLES:
  pngine check scene.pngb
  pngine check scene.png"#,
        )
        .arg(input_arg())
        .arg(fuel_arg())
}

/// Disassembly listing.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show a module as an assembly listing")
        .arg(input_arg())
        .arg(color_arg())
}

/// Zip bundle.
pub fn bundle_command() -> Command {
    Command::new("bundle")
        .about("Package a module into a zip bundle")
        .after_help(
            r#"EXAMPLES:
  pngine bundle scene.pngb -o scene.zip
  pngine bundle scene.pasm -o scene.zip --runtime pngine.wasm --asset noise.bin"#,
        )
        .arg(input_arg())
        .arg(required_output_arg())
        .arg(entry_arg())
        .arg(runtime_arg())
        .arg(asset_arg())
}

/// Container inspection.
pub fn list_command() -> Command {
    Command::new("list")
        .about("List the chunks of a PNG or the files of a bundle")
        .arg(input_arg())
}

/// Add module chunks to an existing PNG.
pub fn embed_command() -> Command {
    Command::new("embed")
        .about("Embed a module into an existing PNG")
        .arg(image_arg())
        .arg(module_arg())
        .arg(required_output_arg())
        .arg(runtime_arg())
}

/// Pull the module out of a PNG or bundle.
pub fn extract_command() -> Command {
    Command::new("extract")
        .about("Extract the module from a PNG or bundle")
        .arg(input_arg())
        .arg(required_output_arg())
        .arg(runtime_out_arg())
}
