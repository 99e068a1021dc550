use indoc::indoc;
use pngine_bytecode::bytecode::{DecodeError, Instruction, ModuleBuilder, Opcode, assemble};
use pngine_core::Colors;

use super::error::{DispatchError, RuntimeError};
use super::resources::{ResourceError, ResourceKind};
use super::trace::{PrintTracer, Verbosity};
use super::vm::{Dispatcher, Limits, RuntimeInputs, Step};
use crate::backends::{Call, NoopBackend};

fn dispatcher(source: &str) -> Dispatcher<NoopBackend> {
    Dispatcher::new(assemble(source).unwrap(), NoopBackend::default())
}

fn with_limits(source: &str, limits: Limits) -> Dispatcher<NoopBackend> {
    Dispatcher::with_limits(assemble(source).unwrap(), NoopBackend::default(), limits)
}

const TRIANGLE: &str = indoc! {r#"
    .string main "main"
    .string vs "vs_main"
    .string fs "fs_main"
    .data shader "@vertex fn vs_main() {}"
    .data pipe hex:01020000

    create_buffer 0 16 0x48
    create_shader_module 0 $shader
    create_render_pipeline 0 0 $pipe
    define_frame 0 @main
      write_time_uniform 0 0 16
      begin_render_pass 0 0 0 0
      set_pipeline 0
      draw 3 1 0 0
      end_pass
      submit
    end_frame
"#};

fn triangle_frame_calls() -> Vec<Call> {
    vec![
        Call::WriteBuffer {
            id: 0,
            offset: 0,
            bytes: 16,
        },
        Call::BeginRenderPass {
            color: None,
            clear: true,
            depth: None,
        },
        Call::SetPipeline { id: 0 },
        Call::Draw {
            vertices: 3,
            instances: 1,
        },
        Call::EndPass,
        Call::Submit,
    ]
}

fn triangle_init_calls() -> Vec<Call> {
    vec![
        Call::CreateBuffer {
            id: 0,
            size: 16,
            usage: 0x48,
        },
        Call::CreateShaderModule { id: 0, bytes: 23 },
        Call::CreateRenderPipeline {
            id: 0,
            shader: 0,
            vertex: "vs_main".into(),
            fragment: "fs_main".into(),
        },
    ]
}

#[test]
fn execute_all_runs_frames_inline() {
    let mut d = dispatcher(TRIANGLE);
    d.execute_all().unwrap();

    let mut expected = triangle_init_calls();
    expected.extend(triangle_frame_calls());
    assert_eq!(d.backend().calls(), expected);
    assert_eq!(d.frame_counter(), 1);
    assert_eq!(d.resources().len(), 3);
    assert_eq!(d.context().pass, None);
}

#[test]
fn init_then_frames() {
    let mut d = dispatcher(TRIANGLE);
    d.execute_init().unwrap();
    assert_eq!(d.backend_mut().take_calls(), triangle_init_calls());
    assert_eq!(d.frame_counter(), 0);

    d.execute_frame(0).unwrap();
    d.execute_frame_by_name("main").unwrap();
    d.execute_frame_by_id(0).unwrap();

    assert_eq!(d.frame_counter(), 3);
    assert_eq!(d.backend().count(|c| matches!(c, Call::Draw { .. })), 3);
    assert_eq!(d.backend().count(|c| matches!(c, Call::CreateBuffer { .. })), 0);
    assert_eq!(d.frame_count(), 1);
    assert_eq!(d.frame_name(0).as_deref(), Some("main"));
    assert_eq!(d.frame_name(1), None);
}

#[test]
fn missing_frame() {
    let mut d = dispatcher(TRIANGLE);
    d.execute_init().unwrap();

    let err = d.execute_frame_by_name("outro").unwrap_err();
    assert_eq!(err.offset, 0);
    assert_eq!(err.opcode, None);
    assert_eq!(err.to_string(), "frame `outro` not found (at offset 0)");

    let err = d.execute_frame(4).unwrap_err();
    assert_eq!(err.kind, RuntimeError::FrameNotFound("#4".into()));
}

const TWO_FRAMES: &str = indoc! {r#"
    create_buffer 0 16 0x48
    define_frame 0 "ok"
      submit
    end_frame
    define_frame 1 "broken"
      begin_render_pass 0 0 0 0
      draw 3 1 0 0
      end_pass
    end_frame
"#};

#[test]
fn failed_frame_keeps_resources_and_counter() {
    let mut d = dispatcher(TWO_FRAMES);
    d.execute_init().unwrap();
    d.execute_frame_by_name("ok").unwrap();

    let err = d.execute_frame_by_name("broken").unwrap_err();
    assert_eq!(err.offset, 17);
    assert_eq!(err.opcode, Some(Opcode::Draw));
    assert_eq!(
        err.kind,
        RuntimeError::InvalidState {
            op: "draw",
            reason: "without a bound pipeline",
        }
    );
    assert_eq!(
        err.to_string(),
        "draw without a bound pipeline (at offset 17, draw)"
    );

    assert_eq!(d.frame_counter(), 1);
    assert_eq!(d.resources().len(), 1);
    assert_eq!(d.context().pass, None);

    d.execute_frame_by_name("ok").unwrap();
    assert_eq!(d.frame_counter(), 2);
}

#[test]
fn frame_must_close_its_pass() {
    let mut d = dispatcher(indoc! {r#"
        define_frame 0 "open"
          begin_compute_pass
        end_frame
    "#});

    let err = d.execute_frame(0).unwrap_err();
    assert_eq!(err.offset, 4);
    assert_eq!(err.opcode, Some(Opcode::EndFrame));
    assert_eq!(
        err.kind,
        RuntimeError::InvalidState {
            op: "end_frame",
            reason: "inside an open pass",
        }
    );
    assert_eq!(d.frame_counter(), 0);
}

#[test]
fn frames_are_isolated() {
    let mut d = dispatcher(indoc! {r#"
        define_frame 0 "a"
          begin_compute_pass
          end_pass
        end_frame
        define_frame 1 "b"
          end_pass
        end_frame
    "#});

    d.execute_frame(0).unwrap();
    let err = d.execute_frame(1).unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::InvalidState {
            op: "end_pass",
            reason: "outside a pass",
        }
    );
}

#[test]
fn named_frame_runs_only_its_body() {
    let mut d = dispatcher(indoc! {r#"
        create_buffer 0 16 0x48
        define_frame 0 "a"
          begin_compute_pass
          end_pass
        end_frame
        create_buffer 1 32 0x48
        define_frame 1 "b"
          write_time_uniform 0 0 16
          submit
        end_frame
        define_frame 2 "c"
          begin_compute_pass
          end_pass
          submit
        end_frame
    "#});
    d.execute_init().unwrap();
    d.backend_mut().take_calls();

    d.execute_frame_by_name("b").unwrap();
    assert_eq!(
        d.backend().calls(),
        [
            Call::WriteBuffer {
                id: 0,
                offset: 0,
                bytes: 16,
            },
            Call::Submit,
        ]
    );
    assert_eq!(d.frame_counter(), 1);
}

#[test]
fn textured_triangle_end_to_end() {
    let mut d = dispatcher(indoc! {r#"
        .string main "main"
        .string vs "vs"
        .string fs "fsx"
        .data shader "@vertex fn vs() {} @fragment fn fsx() {}"
        .data pipe hex:01020000

        create_buffer 0 1024 0x28
        create_shader_module 0 $shader
        create_render_pipeline 0 0 $pipe
        define_frame 0 @main
          begin_render_pass 0 0 0 0
          set_pipeline 0
          draw 3 1 0 0
          end_pass
          submit
        end_frame
    "#});
    d.execute_all().unwrap();

    assert_eq!(
        d.backend().calls(),
        [
            Call::CreateBuffer {
                id: 0,
                size: 1024,
                usage: 0x28,
            },
            Call::CreateShaderModule { id: 0, bytes: 40 },
            Call::CreateRenderPipeline {
                id: 0,
                shader: 0,
                vertex: "vs".into(),
                fragment: "fsx".into(),
            },
            Call::BeginRenderPass {
                color: None,
                clear: true,
                depth: None,
            },
            Call::SetPipeline { id: 0 },
            Call::Draw {
                vertices: 3,
                instances: 1,
            },
            Call::EndPass,
            Call::Submit,
        ]
    );
    assert_eq!(d.frame_counter(), 1);
}

fn unknown_opcode_at(err: &DispatchError, offset: usize) -> bool {
    err.offset == offset
        && matches!(
            err.kind,
            RuntimeError::Decode(DecodeError::UnknownOpcode { byte: 0xEE, .. })
        )
}

#[test]
fn corrupt_sibling_frame() {
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
    let mut d = Dispatcher::new(builder.finish().unwrap(), NoopBackend::default());

    d.execute_frame_by_name("a").unwrap();
    assert_eq!(d.backend().calls(), [Call::Submit]);
    assert_eq!(d.frame_count(), 2);

    let err = d.execute_frame_by_name("b").unwrap_err();
    assert!(unknown_opcode_at(&err, 8), "{err:?}");
    let err = d.execute_frame_by_name("c").unwrap_err();
    assert!(unknown_opcode_at(&err, 8), "{err:?}");
    assert_eq!(d.frame_counter(), 1);
}

#[test]
fn corrupt_tail() {
    let mut builder = ModuleBuilder::new();
    builder
        .emit(Instruction::CreateBuffer {
            buffer: 0,
            size: 16,
            usage: 0x48,
        })
        .unwrap();
    builder.emit_raw(&[0xEE]);
    let module = builder.finish().unwrap();
    let created = Call::CreateBuffer {
        id: 0,
        size: 16,
        usage: 0x48,
    };

    let mut d = Dispatcher::new(module.clone(), NoopBackend::default());
    assert_eq!(d.step().unwrap(), Step::Continue);
    assert_eq!(d.backend().calls(), [created.clone()]);
    let err = d.step().unwrap_err();
    assert!(unknown_opcode_at(&err, 4), "{err:?}");

    let mut d = Dispatcher::new(module.clone(), NoopBackend::default());
    let err = d.execute_all().unwrap_err();
    assert!(unknown_opcode_at(&err, 4), "{err:?}");
    assert_eq!(d.backend().calls(), [created.clone()]);

    let mut d = Dispatcher::new(module, NoopBackend::default());
    let err = d.execute_init().unwrap_err();
    assert!(unknown_opcode_at(&err, 4), "{err:?}");
    assert_eq!(d.backend().calls(), [created]);
}

const POOLED: &str = indoc! {r#"
    .string vs "vs_main"
    .string fs "fs_main"
    .data shader "@vertex fn vs_main() {}"
    .data pipe hex:00010000

    create_buffer 0 16 0x20
    create_buffer 1 16 0x20
    create_buffer 2 16 0x20
    create_shader_module 0 $shader
    create_render_pipeline 0 0 $pipe
    define_frame 0 "main"
      begin_render_pass 0 0 0 0
      set_pipeline 0
      set_vertex_buffer_pool 0 0 3 0
      set_vertex_buffer_pool 1 0 3 1
      draw 3 1 0 0
      end_pass
    end_frame
"#};

fn vertex_buffers(calls: &[Call]) -> Vec<(u8, u32)> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::SetVertexBuffer { slot, id } => Some((*slot, *id)),
            _ => None,
        })
        .collect()
}

#[test]
fn pool_rotates_with_frame_counter() {
    let mut d = dispatcher(POOLED);
    d.execute_init().unwrap();
    d.backend_mut().take_calls();

    let mut frames = Vec::new();
    for _ in 0..4 {
        d.execute_frame(0).unwrap();
        frames.push(vertex_buffers(&d.backend_mut().take_calls()));
    }

    assert_eq!(
        frames,
        vec![
            vec![(0, 0), (1, 1)],
            vec![(0, 1), (1, 2)],
            vec![(0, 2), (1, 0)],
            vec![(0, 0), (1, 1)],
        ]
    );
}

#[test]
fn pool_selection_is_deterministic() {
    let run = || {
        let mut d = dispatcher(POOLED);
        d.execute_init().unwrap();
        for _ in 0..5 {
            d.execute_frame(0).unwrap();
        }
        d.into_backend().take_calls()
    };

    assert_eq!(run(), run());
}

#[test]
fn pool_of_zero_is_rejected() {
    let mut d = dispatcher(indoc! {r#"
        define_frame 0 "main"
          begin_compute_pass
          set_bind_group_pool 0 0 0 0
          end_pass
        end_frame
    "#});

    let err = d.execute_frame(0).unwrap_err();
    assert_eq!(err.opcode, Some(Opcode::SetBindGroupPool));
    assert!(matches!(
        err.kind,
        RuntimeError::Decode(DecodeError::InvalidValue {
            what: "pool size",
            ..
        })
    ));
}

const COMPUTE: &str = indoc! {r#"
    .string cs "cs_main"
    .data shader "@compute fn cs_main() {}"

    define_pass 0
      begin_compute_pass
      set_pipeline 1
      dispatch 8 8 1
      end_pass
    end_pass_def
    create_shader_module 0 $shader
    create_compute_pipeline 1 0 @cs
    define_frame 0 "main"
      exec_pass 0
      exec_pass 0
      submit
    end_frame
"#};

#[test]
fn exec_pass_runs_definition_body() {
    let mut d = dispatcher(COMPUTE);
    d.execute_init().unwrap();
    assert_eq!(
        d.backend_mut().take_calls(),
        vec![
            Call::CreateShaderModule { id: 0, bytes: 24 },
            Call::CreateComputePipeline {
                id: 1,
                shader: 0,
                entry: "cs_main".into(),
            },
        ]
    );

    d.execute_frame(0).unwrap();
    let pass = [
        Call::BeginComputePass,
        Call::SetPipeline { id: 1 },
        Call::Dispatch { x: 8, y: 8, z: 1 },
        Call::EndPass,
    ];
    let mut expected = pass.to_vec();
    expected.extend(pass);
    expected.push(Call::Submit);
    assert_eq!(d.backend().calls(), expected);
}

#[test]
fn exec_pass_unknown_id() {
    let mut d = dispatcher(indoc! {r#"
        define_frame 0 "main"
          exec_pass 9
        end_frame
    "#});

    let err = d.execute_frame(0).unwrap_err();
    assert_eq!(err.kind, RuntimeError::UnknownPass(9));
}

#[test]
fn pipeline_kind_must_match_pass() {
    let mut d = dispatcher(indoc! {r#"
        .data shader "@compute fn cs_main() {}"
        create_shader_module 0 $shader
        create_compute_pipeline 0 0 "cs_main"
        define_frame 0 "main"
          begin_render_pass 0 0 0 0
          set_pipeline 0
          end_pass
        end_frame
    "#});
    d.execute_init().unwrap();

    let err = d.execute_frame(0).unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::InvalidState {
            op: "set_pipeline",
            reason: "pipeline kind does not match the pass",
        }
    );
}

#[test]
fn pass_state_checks() {
    let cases = [
        (
            "begin_compute_pass\nsubmit\nend_pass",
            "submit",
            "inside an open pass",
        ),
        (
            "begin_compute_pass\nbegin_compute_pass\nend_pass",
            "begin_compute_pass",
            "inside an open pass",
        ),
        ("draw 3 1 0 0", "draw", "outside a pass"),
        (
            "begin_compute_pass\nset_vertex_buffer 0 0\nend_pass",
            "set_vertex_buffer",
            "inside a compute pass",
        ),
        (
            "begin_render_pass 0 0 0 0\ndispatch 1 1 1\nend_pass",
            "dispatch",
            "inside a render pass",
        ),
    ];

    for (body, op, reason) in cases {
        let source = format!("create_buffer 0 16 0x20\ndefine_frame 0 \"f\"\n{body}\nend_frame\n");
        let mut d = dispatcher(&source);
        d.execute_init().unwrap();
        let err = d.execute_frame(0).unwrap_err();
        assert_eq!(err.kind, RuntimeError::InvalidState { op, reason }, "{body}");
    }
}

#[test]
fn draw_indexed_needs_index_buffer() {
    let mut d = dispatcher(indoc! {r#"
        .string vs "vs_main"
        .string fs "fs_main"
        .data shader "@vertex fn vs_main() {}"
        .data pipe hex:00010000
        create_buffer 0 64 0x10
        create_shader_module 0 $shader
        create_render_pipeline 0 0 $pipe
        define_frame 0 "indexed"
          begin_render_pass 0 0 0 0
          set_pipeline 0
          set_index_buffer 0 1
          draw_indexed 6 1 0 0 0
          end_pass
        end_frame
        define_frame 1 "unindexed"
          begin_render_pass 0 0 0 0
          set_pipeline 0
          draw_indexed 6 1 0 0 0
          end_pass
        end_frame
    "#});
    d.execute_init().unwrap();

    d.execute_frame(0).unwrap();
    assert!(d.backend().calls().contains(&Call::SetIndexBuffer { id: 0, wide: true }));
    assert!(d.backend().calls().contains(&Call::DrawIndexed {
        indices: 6,
        instances: 1
    }));

    let err = d.execute_frame(1).unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::InvalidState {
            op: "draw_indexed",
            reason: "without an index buffer",
        }
    );
}

#[test]
fn duplicate_create_is_rejected_before_backend() {
    let mut d = dispatcher(indoc! {"
        create_buffer 0 16 0x20
        create_buffer 0 32 0x20
    "});

    let err = d.execute_all().unwrap_err();
    assert_eq!(err.offset, 4);
    assert_eq!(
        err.kind,
        RuntimeError::Resource(ResourceError::AlreadyExists {
            kind: ResourceKind::Buffer,
            id: 0,
        })
    );
    assert_eq!(d.backend().count(|c| matches!(c, Call::CreateBuffer { .. })), 1);
    assert_eq!(d.resources().buffer(0).unwrap().size, 16);
}

#[test]
fn resource_id_limit() {
    let mut d = with_limits(
        "create_buffer 11 16 0x20",
        Limits::default().with_max_resource_id(10),
    );

    let err = d.execute_all().unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::Resource(ResourceError::IdTooLarge {
            kind: ResourceKind::Buffer,
            id: 11,
            limit: 10,
        })
    );
    assert!(d.backend().calls().is_empty());
}

#[test]
fn unknown_resources() {
    let mut d = dispatcher(indoc! {r#"
        define_frame 0 "main"
          begin_render_pass 5 0 0 0
          end_pass
        end_frame
    "#});

    let err = d.execute_frame(0).unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::Resource(ResourceError::NotCreated {
            kind: ResourceKind::Texture,
            id: 4,
        })
    );
}

#[test]
fn fuel_limits_a_run() {
    let mut d = with_limits(
        indoc! {r#"
            define_frame 0 "spin"
              nop
              nop
              nop
              nop
            end_frame
        "#},
        Limits::default().with_exec_fuel(3),
    );

    let err = d.execute_frame(0).unwrap_err();
    assert_eq!(err.kind, RuntimeError::ExecFuelExhausted(3));
    assert_eq!(err.offset, 6);
    assert_eq!(d.frame_counter(), 0);
}

#[test]
fn time_uniform() {
    let inputs = RuntimeInputs {
        time: 2.0,
        width: 800,
        height: 400,
    };
    let block = inputs.time_block();
    assert_eq!(&block[0..4], &2.0f32.to_le_bytes());
    assert_eq!(&block[12..16], &2.0f32.to_le_bytes());

    let mut d = Dispatcher::new(
        assemble("create_buffer 0 8 0x48\nwrite_time_uniform 0 0 8").unwrap(),
        NoopBackend::new(800, 400),
    );
    assert_eq!(d.inputs().width, 800);
    d.set_time(2.0);
    d.execute_all().unwrap();
    assert_eq!(
        d.backend().calls().last(),
        Some(&Call::WriteBuffer {
            id: 0,
            offset: 0,
            bytes: 8,
        })
    );
}

#[test]
fn time_uniform_bounds() {
    let mut d = dispatcher("create_buffer 0 8 0x48\nwrite_time_uniform 0 0 16");
    let err = d.execute_all().unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::OutOfBounds {
            buffer: 0,
            offset: 0,
            len: 16,
            size: 8,
        }
    );

    let mut d = dispatcher("create_buffer 0 8 0x48\nwrite_time_uniform 0 0 5");
    let err = d.execute_all().unwrap_err();
    assert_eq!(err.kind, RuntimeError::TimeUniformSize(5));
}

#[test]
fn zero_height_aspect() {
    let inputs = RuntimeInputs {
        time: 0.0,
        width: 10,
        height: 0,
    };
    assert_eq!(inputs.aspect(), 0.0);
}

#[test]
fn host_buffer_writes() {
    let mut d = dispatcher("create_buffer 0 16 0x48");
    d.execute_init().unwrap();

    d.write_buffer(0, 8, &[0; 8]).unwrap();
    assert_eq!(
        d.write_buffer(0, 12, &[0; 8]),
        Err(RuntimeError::OutOfBounds {
            buffer: 0,
            offset: 12,
            len: 8,
            size: 16,
        })
    );
    assert_eq!(
        d.write_buffer(3, 0, &[0; 4]),
        Err(RuntimeError::Resource(ResourceError::NotCreated {
            kind: ResourceKind::Buffer,
            id: 3,
        }))
    );
}

#[test]
fn typed_arrays_feed_buffers() {
    let mut d = dispatcher(indoc! {"
        .data zero f32:0.0
        .data one f32:1.0
        .data seed u32:7
        create_buffer 0 16 0x48
        create_typed_array 0 0 4
        fill_linear 0 0 4 1 $zero $one
        write_buffer_from_array 0 0 0
        create_typed_array 1 1 2
        fill_random 1 0 2 1 $seed $zero $one
    "});
    d.execute_all().unwrap();

    let array = d.resources().arrays.get(0).unwrap();
    assert_eq!(array.get(3), Some(3.0));
    assert!(d.backend().calls().contains(&Call::WriteBuffer {
        id: 0,
        offset: 0,
        bytes: 16,
    }));
    assert_eq!(d.resources().arrays.len(), 2);
}

#[test]
fn typed_array_limits_and_values() {
    let mut d = with_limits(
        "create_typed_array 0 0 100",
        Limits::default().with_max_array_elements(64),
    );
    let err = d.execute_all().unwrap_err();
    assert!(matches!(err.kind, RuntimeError::DataGen(_)));

    let mut d = dispatcher(indoc! {"
        .data wide u32:1,2
        create_typed_array 0 0 4
        fill_constant 0 0 4 1 $wide
    "});
    let err = d.execute_all().unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeError::DataSize {
            what: "an f32 value",
            data: 0,
            expected: 4,
            actual: 8,
        }
    );

    let mut d = dispatcher(indoc! {"
        .data bad hex:ff
        create_typed_array 0 0 4
        fill_expression 0 0 4 1 $bad
    "});
    let err = d.execute_all().unwrap_err();
    assert!(matches!(err.kind, RuntimeError::Expr { data: 0, .. }));
}

#[test]
fn step_walks_the_stream() {
    let mut d = dispatcher(TRIANGLE);
    let mut steps = 0;
    while d.step().unwrap() == Step::Continue {
        steps += 1;
    }
    assert_eq!(steps, 10);
    assert_eq!(d.frame_counter(), 1);
    assert_eq!(d.step().unwrap(), Step::End);

    d.rewind();
    assert_eq!(d.pc(), 0);
}

#[test]
fn trace_frame() {
    let mut d = dispatcher(indoc! {r#"
        .string main "main"
        create_buffer 0 16 0x48
        define_frame 0 @main
          write_time_uniform 0 0 16
          submit
        end_frame
    "#});
    d.execute_init().unwrap();

    let mut tracer = PrintTracer::new(d.module(), Verbosity::Default, Colors::OFF);
    d.execute_frame_with(0, &mut tracer).unwrap();

    insta::assert_snapshot!(tracer.lines().join("\n"), @r"
    -- frame 0 (counter 0)
    0007    write_time_uniform 0 0 16
    0011    submit
    -- end frame 0 (counter 1)
    ");
}

#[test]
fn trace_verbose_run() {
    let mut d = dispatcher(indoc! {r#"
        .string main "main"
        create_buffer 0 16 0x48
        define_frame 0 @main
          submit
        end_frame
    "#});

    let mut tracer = PrintTracer::new(d.module(), Verbosity::Verbose, Colors::OFF);
    d.execute_all_with(&mut tracer).unwrap();

    insta::assert_snapshot!(tracer.lines().join("\n"), @r#"
    0000  create_buffer buffer=0 size=16 usage=72
    0004  define_frame frame=0 name="main"
    -- frame 0 (counter 0)
    0007    submit
    0008    end_frame
    -- end frame 0 (counter 1)
    "#);
}

#[test]
fn trace_records_errors() {
    let mut d = dispatcher(indoc! {r#"
        define_frame 0 "main"
          exec_pass 2
        end_frame
    "#});

    let mut tracer = PrintTracer::new(d.module(), Verbosity::Default, Colors::OFF);
    d.execute_frame_with(0, &mut tracer).unwrap_err();

    insta::assert_snapshot!(tracer.lines().join("\n"), @r"
    -- frame 0 (counter 0)
    0003    exec_pass 2
    error: pass 2 is not defined (at offset 3, exec_pass)
    ");
}
