use indoc::indoc;
use pngine_bytecode::assemble;
use pngine_core::Colors;
use pngine_vm::{Limits, Verbosity};

use super::validate::{Options, Phase, validate};

const CLOCK: &str = indoc! {r#"
    .string main "main"
    create_buffer 0 16 0x48
    define_frame 0 @main
      write_time_uniform 0 0 4
      submit
    end_frame
"#};

fn options(frames: u32) -> Options {
    Options {
        phase: Phase::Frames,
        frames,
        frame: None,
        limits: Limits::default(),
        trace: None,
        colors: Colors::OFF,
    }
}

#[test]
fn report_json() {
    let (report, trace) = validate(assemble(CLOCK).unwrap(), &options(1));

    assert!(trace.is_empty());
    assert_eq!(
        serde_json::to_string(&report).unwrap(),
        concat!(
            r#"{"valid":true,"#,
            r#""module":{"version":3,"bytecode":13,"capabilities":["time-uniform"],"frames":1,"uniforms":0,"scenes":0},"#,
            r#""phases":[{"phase":"init","ok":true,"commands":1},{"phase":"frames","ok":true,"commands":2}],"#,
            r#""frames":[{"index":0,"time":0.0,"commands":2,"bytes":26,"differs":false}]}"#,
        )
    );
}

#[test]
fn frames_are_diffed_against_the_first() {
    let (report, _) = validate(assemble(CLOCK).unwrap(), &options(3));
    let differs: Vec<bool> = report.frames.iter().map(|f| f.differs).collect();
    assert_eq!(differs, [false, true, true]);
    assert_eq!(report.phases[1].commands, 6);

    let still = assemble(indoc! {r#"
        define_frame 0 "main"
          submit
        end_frame
    "#})
    .unwrap();
    let (report, _) = validate(still, &options(3));
    assert!(report.frames.iter().all(|f| !f.differs));
}

#[test]
fn init_failure_stops_the_run() {
    let module = assemble("create_buffer 0 16 0\ncreate_buffer 0 16 0").unwrap();
    let (report, _) = validate(module, &options(2));

    assert!(!report.valid);
    assert_eq!(report.phases.len(), 1);
    let error = report.phases[0].error.as_ref().unwrap();
    assert_eq!(error.offset, Some(4));
    assert_eq!(error.opcode, Some("create_buffer"));
    assert!(report.frames.is_empty());
}

#[test]
fn init_phase_only() {
    let mut opts = options(5);
    opts.phase = Phase::Init;
    let (report, _) = validate(assemble(CLOCK).unwrap(), &opts);

    assert!(report.valid);
    assert_eq!(report.phases.len(), 1);
    assert!(report.frames.is_empty());
}

#[test]
fn frame_failure_is_reported() {
    let module = assemble(indoc! {r#"
        define_frame 0 "main"
          end_pass
        end_frame
    "#})
    .unwrap();
    let (report, _) = validate(module, &options(4));

    assert!(!report.valid);
    let frames = &report.phases[1];
    assert!(!frames.ok);
    assert_eq!(frames.error.as_ref().unwrap().opcode, Some("end_pass"));
    assert!(report.frames.is_empty());
}

#[test]
fn named_frame() {
    let module = assemble(indoc! {r#"
        define_frame 0 "main"
          submit
        end_frame
        define_frame 1 "post"
          submit
          submit
        end_frame
    "#})
    .unwrap();

    let mut opts = options(1);
    opts.frame = Some("post".into());
    let (report, _) = validate(module.clone(), &opts);
    assert_eq!(report.frames[0].commands, 2);

    opts.frame = Some("missing".into());
    let (report, _) = validate(module, &opts);
    let error = report.phases[1].error.as_ref().unwrap();
    assert_eq!(error.message, "frame `missing` not found");
    assert_eq!(error.offset, None);
}

#[test]
fn module_without_frames() {
    let (report, _) = validate(assemble("create_buffer 0 16 0").unwrap(), &options(3));

    assert!(report.valid);
    assert_eq!(report.phases[1].commands, 0);
    assert!(report.frames.is_empty());
}

#[test]
fn trace_lines() {
    let mut opts = options(1);
    opts.trace = Some(Verbosity::Default);
    let (_, trace) = validate(assemble(CLOCK).unwrap(), &opts);

    assert!(trace.iter().any(|line| line.contains("create_buffer")));
    assert!(trace.iter().any(|line| line.trim_end().ends_with("submit")));
}
