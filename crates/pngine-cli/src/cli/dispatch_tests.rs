//! Tests for CLI dispatch logic.
//!
//! Global flags are declared on the root command, so most tests parse the
//! full command line and look at the subcommand matches.

use std::path::PathBuf;

use clap::ArgMatches;
use clap::error::ErrorKind;
use pngine_vm::Verbosity;

use super::*;
use crate::cli::commands::{compile_command, extract_command};
use crate::commands::render::RenderArgs;
use crate::commands::validate::{Phase, ValidateArgs};

fn parse(args: &[&str]) -> (String, ArgMatches) {
    let m = build_cli()
        .try_get_matches_from(std::iter::once("pngine").chain(args.iter().copied()))
        .unwrap();
    let (name, sub) = m.subcommand().unwrap();
    (name.to_owned(), sub.clone())
}

fn usage_error(args: &[&str]) -> ErrorKind {
    build_cli()
        .try_get_matches_from(std::iter::once("pngine").chain(args.iter().copied()))
        .unwrap_err()
        .kind()
}

#[test]
fn compile_output_is_optional() {
    let m = compile_command()
        .try_get_matches_from(["compile", "scene.pasm"])
        .unwrap();
    let params = CompileParams::from_matches(&m);
    assert_eq!(params.input, PathBuf::from("scene.pasm"));
    assert_eq!(params.output, None);

    let m = compile_command()
        .try_get_matches_from(["compile", "scene.pasm", "-o", "out.pngb"])
        .unwrap();
    assert_eq!(
        CompileParams::from_matches(&m).output,
        Some(PathBuf::from("out.pngb"))
    );
}

#[test]
fn render_defaults() {
    let (name, m) = parse(&["render", "scene.pngb", "-o", "scene.png"]);
    assert_eq!(name, "render");

    let args: RenderArgs = RenderParams::from_matches(&m).into();
    assert_eq!(args.output, PathBuf::from("scene.png"));
    assert_eq!((args.width, args.height), (512, 512));
    assert_eq!(args.time, 0.0);
    assert_eq!(args.scene, None);
    assert!(args.embed);
    assert!(args.exec);
}

#[test]
fn render_flags_invert() {
    let (_, m) = parse(&[
        "render",
        "scene.pngb",
        "-o",
        "scene.png",
        "--no-embed",
        "--no-exec",
        "--width",
        "64",
        "-t",
        "2.5",
    ]);
    let args: RenderArgs = RenderParams::from_matches(&m).into();
    assert!(!args.embed);
    assert!(!args.exec);
    assert_eq!(args.width, 64);
    assert_eq!(args.time, 2.5);
}

#[test]
fn render_usage_errors() {
    assert_eq!(
        usage_error(&["render", "scene.pngb"]),
        ErrorKind::MissingRequiredArgument
    );
    assert_eq!(
        usage_error(&["render", "a.pngb", "-o", "a.png", "--width", "0"]),
        ErrorKind::ValueValidation
    );
    assert_eq!(
        usage_error(&["render", "a.pngb", "-o", "a.png", "-t", "1", "--scene", "intro"]),
        ErrorKind::ArgumentConflict
    );
}

#[test]
fn validate_verbosity_selects_trace() {
    let cases = [
        (vec!["validate", "a.pngb"], None),
        (vec!["-v", "validate", "a.pngb"], Some(Verbosity::Default)),
        (vec!["validate", "a.pngb", "-vv"], Some(Verbosity::Verbose)),
    ];
    for (argv, expected) in cases {
        let (_, m) = parse(&argv);
        let args: ValidateArgs = ValidateParams::from_matches(&m).into();
        assert_eq!(args.trace, expected, "{argv:?}");
    }
}

#[test]
fn validate_options() {
    let (_, m) = parse(&[
        "validate",
        "a.png",
        "--phase",
        "init",
        "--frames",
        "10",
        "--frame",
        "post",
        "--fuel",
        "99",
        "--compact",
        "--color",
        "never",
    ]);
    let params = ValidateParams::from_matches(&m);
    assert_eq!(params.phase, Phase::Init);
    assert_eq!(params.color, ColorChoice::Never);

    let args: ValidateArgs = params.into();
    assert_eq!(args.frames, 10);
    assert_eq!(args.frame.as_deref(), Some("post"));
    assert_eq!(args.fuel, 99);
    assert!(args.compact);
    assert!(!args.color);

    assert_eq!(
        usage_error(&["validate", "a.png", "--phase", "draw"]),
        ErrorKind::InvalidValue
    );
}

#[test]
fn bundle_collects_assets() {
    let (_, m) = parse(&[
        "bundle",
        "scene.pasm",
        "-o",
        "scene.zip",
        "--asset",
        "a.bin",
        "--asset",
        "b.bin",
    ]);
    let params = BundleParams::from_matches(&m);
    assert_eq!(params.entry, "main.pngb");
    assert_eq!(
        params.assets,
        [PathBuf::from("a.bin"), PathBuf::from("b.bin")]
    );
    assert_eq!(params.runtime, None);
}

#[test]
fn embed_takes_two_positionals() {
    let (_, m) = parse(&["embed", "base.png", "scene.pngb", "-o", "out.png"]);
    let params = EmbedParams::from_matches(&m);
    assert_eq!(params.image, PathBuf::from("base.png"));
    assert_eq!(params.module, PathBuf::from("scene.pngb"));
    assert_eq!(params.output, PathBuf::from("out.png"));
}

#[test]
fn extract_runtime_out() {
    let m = extract_command()
        .try_get_matches_from(["extract", "a.png", "-o", "a.pngb", "--runtime-out", "a.wasm"])
        .unwrap();
    let params = ExtractParams::from_matches(&m);
    assert_eq!(params.runtime_out, Some(PathBuf::from("a.wasm")));
}

#[test]
fn subcommand_is_required() {
    assert_eq!(
        usage_error(&[]),
        ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    );
    assert_eq!(usage_error(&["play"]), ErrorKind::InvalidSubcommand);
}
