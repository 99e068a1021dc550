use indoc::indoc;
use pngine_bytecode::bytecode::{DecodeError, Instruction, ModuleBuilder, Opcode, assemble};

use super::error::RuntimeError;
use super::frame::FrameIndex;

fn build(source: &str) -> FrameIndex {
    let index = FrameIndex::build(&assemble(source).unwrap());
    assert_eq!(index.fault(), None);
    index
}

fn structure_error(source: &str) -> (usize, Option<Opcode>, &'static str) {
    let index = FrameIndex::build(&assemble(source).unwrap());
    let err = index.fault().cloned().unwrap();
    let RuntimeError::Structure(reason) = err.kind else {
        panic!("expected a structure error, got {:?}", err.kind);
    };
    (err.offset, err.opcode, reason)
}

#[test]
fn spans_cover_bodies() {
    let module = assemble(indoc! {r#"
        create_buffer 0 16 0
        define_pass 3
          begin_compute_pass
          end_pass
        end_pass_def
        define_frame 7 "main"
          exec_pass 3
        end_frame
        define_frame 8 "post"
        end_frame
    "#})
    .unwrap();
    let index = FrameIndex::build(&module);
    assert_eq!(index.fault(), None);

    // create_buffer: 4 bytes, define_pass: 2, begin/end: 1 each, end_pass_def: 1
    let pass = index.pass(3).unwrap();
    assert_eq!((pass.start, pass.body_start, pass.body_end, pass.end), (4, 6, 8, 9));
    assert_eq!(index.pass_at(4), Some(pass));
    assert_eq!(index.passes().len(), 1);

    let main = index.frame(0).unwrap();
    assert_eq!(main.id, 7);
    assert_eq!((main.start, main.body_start, main.body_end, main.end), (9, 12, 14, 15));
    assert_eq!(index.frame_at(9), Some(main));

    assert_eq!(index.frames().len(), 2);
    assert_eq!(index.frame_by_id(8), Some(1));
    assert_eq!(index.frame_by_name(&module, "post"), Some(1));
    assert_eq!(index.frame_by_name(&module, "missing"), None);
    assert_eq!(index.frame(2), None);
}

#[test]
fn empty_module_has_no_frames() {
    let index = build("");

    assert!(index.frames().is_empty());
    assert!(index.passes().is_empty());
}

#[test]
fn nested_frame() {
    let (offset, opcode, reason) = structure_error(indoc! {r#"
        define_frame 0 "a"
        define_frame 1 "b"
        end_frame
        end_frame
    "#});

    assert_eq!(offset, 3);
    assert_eq!(opcode, Some(Opcode::DefineFrame));
    assert_eq!(reason, "nested frame");
}

#[test]
fn pass_definition_inside_frame() {
    let (_, _, reason) = structure_error(indoc! {r#"
        define_frame 0 "a"
        define_pass 0
        end_pass_def
        end_frame
    "#});

    assert_eq!(reason, "pass definition inside frame");
}

#[test]
fn frame_inside_pass_definition() {
    let (_, _, reason) = structure_error(indoc! {r#"
        define_pass 0
        define_frame 0 "a"
        end_frame
        end_pass_def
    "#});

    assert_eq!(reason, "frame inside pass definition");
}

#[test]
fn nested_pass_definition() {
    let (_, _, reason) = structure_error(indoc! {"
        define_pass 0
        define_pass 1
        end_pass_def
        end_pass_def
    "});

    assert_eq!(reason, "nested pass definition");
}

#[test]
fn exec_pass_inside_pass_definition() {
    let (offset, opcode, reason) = structure_error(indoc! {"
        define_pass 0
        exec_pass 0
        end_pass_def
    "});

    assert_eq!(offset, 2);
    assert_eq!(opcode, Some(Opcode::ExecPass));
    assert_eq!(reason, "exec_pass inside pass definition");
}

#[test]
fn unmatched_terminators() {
    let (_, opcode, reason) = structure_error("end_frame");
    assert_eq!(opcode, Some(Opcode::EndFrame));
    assert_eq!(reason, "end_frame without define_frame");

    let (_, _, reason) = structure_error("end_pass_def");
    assert_eq!(reason, "end_pass_def without define_pass");

    let (_, _, reason) = structure_error(indoc! {r#"
        define_frame 0 "a"
        end_pass_def
    "#});
    assert_eq!(reason, "end_pass_def without define_pass");
}

#[test]
fn unterminated_regions_report_their_start() {
    let (offset, opcode, reason) = structure_error(indoc! {r#"
        submit
        define_frame 0 "a"
        submit
    "#});
    assert_eq!((offset, opcode), (1, Some(Opcode::DefineFrame)));
    assert_eq!(reason, "unterminated frame");

    let (offset, _, reason) = structure_error("define_pass 0");
    assert_eq!(offset, 0);
    assert_eq!(reason, "unterminated pass definition");
}

#[test]
fn duplicate_ids() {
    let (offset, _, reason) = structure_error(indoc! {r#"
        define_frame 0 "a"
        end_frame
        define_frame 0 "b"
        end_frame
    "#});
    assert_eq!(offset, 4);
    assert_eq!(reason, "duplicate frame id");

    let (_, _, reason) = structure_error(indoc! {"
        define_pass 1
        end_pass_def
        define_pass 1
        end_pass_def
    "});
    assert_eq!(reason, "duplicate pass id");
}

#[test]
fn undecodable_bytecode() {
    let mut builder = ModuleBuilder::new();
    builder.emit_raw(&[0x22, 0xEE]);
    let module = builder.finish().unwrap();

    let index = FrameIndex::build(&module);
    let err = index.fault().unwrap();
    assert_eq!(err.offset, 1);
    assert_eq!(err.opcode, None);
    assert!(matches!(
        err.kind,
        RuntimeError::Decode(DecodeError::UnknownOpcode { byte: 0xEE, .. })
    ));
    assert!(index.frames().is_empty());
}

#[test]
fn regions_before_a_fault_survive() {
    let mut builder = ModuleBuilder::new();
    let a = builder.intern("a");
    let b = builder.intern("b");
    builder
        .emit_all([
            Instruction::DefineFrame { frame: 0, name: a.0 },
            Instruction::Submit {},
            Instruction::EndFrame {},
            Instruction::DefineFrame { frame: 1, name: b.0 },
        ])
        .unwrap();
    builder.emit_raw(&[0xEE]);
    let module = builder.finish().unwrap();
    let index = FrameIndex::build(&module);

    assert_eq!(index.fault().map(|f| f.offset), Some(8));
    assert_eq!(index.frames().len(), 2);

    let first = index.frame(0).unwrap();
    assert!(!first.truncated);
    assert_eq!((first.body_start, first.body_end, first.end), (3, 4, 5));

    let second = index.frame(1).unwrap();
    assert!(second.truncated);
    assert_eq!((second.start, second.body_start, second.body_end), (5, 8, 8));
    assert_eq!(index.frame_by_name(&module, "b"), Some(1));
}

#[test]
fn unterminated_frame_is_kept_empty() {
    let index = FrameIndex::build(&assemble(indoc! {r#"
        define_frame 0 "a"
          submit
    "#}).unwrap());

    let span = index.frame(0).unwrap();
    assert!(span.truncated);
    assert_eq!((span.body_start, span.body_end), (3, 3));
    assert_eq!(index.fault().map(|f| f.offset), Some(0));
}
