//! Bytecode dispatcher.

use pngine_bytecode::bytecode::{
    BiasedId, BindEntry, BindingKind, DataId, DecodeError, ElementType, ExprProgram, IndexFormat,
    Instruction, LoadOp, Module, Opcode, RenderPipelineDescriptor, SamplerDescriptor, StoreOp,
    StringId, TextureDescriptor, decode_bind_entries, decode_instruction,
};

use super::backend::{
    Backend, BindGroupEntry, BindResource, BufferDesc, ColorTarget, DrawArgs, DrawIndexedArgs,
    PipelineKind, RenderPipelineDesc,
};
use super::context::{Context, PassKind};
use super::datagen::{DataGenError, FillRange, TypedArray};
use super::error::{DispatchError, RuntimeError};
use super::frame::{FrameIndex, PassSpan};
use super::resources::{BufferSlot, PipelineSlot, ResourceTable};
use super::trace::{NoopTracer, Tracer};

/// Resource and execution limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum instructions per run (default: 1,000,000).
    pub exec_fuel: u32,
    /// Maximum elements in one typed array (default: 1,048,576).
    pub max_array_elements: u32,
    /// Expression evaluation stack limit (default: 16).
    pub max_expr_stack: usize,
    /// Largest resource ID accepted for any kind (default: 65,535).
    pub max_resource_id: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            exec_fuel: 1_000_000,
            max_array_elements: 1 << 20,
            max_expr_stack: pngine_bytecode::bytecode::expr_ops::MAX_STACK,
            max_resource_id: 65_535,
        }
    }
}

impl Limits {
    pub fn with_exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = fuel;
        self
    }

    pub fn with_max_array_elements(mut self, count: u32) -> Self {
        self.max_array_elements = count;
        self
    }

    pub fn with_max_expr_stack(mut self, depth: usize) -> Self {
        self.max_expr_stack = depth;
        self
    }

    pub fn with_max_resource_id(mut self, id: u32) -> Self {
        self.max_resource_id = id;
        self
    }
}

/// Host-provided values visible to bytecode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuntimeInputs {
    /// Seconds since the start of the animation.
    pub time: f32,
    pub width: u32,
    pub height: u32,
}

impl RuntimeInputs {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// `[time, width, height, aspect]` as little-endian `f32`.
    pub fn time_block(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        let values = [
            self.time,
            self.width as f32,
            self.height as f32,
            self.aspect(),
        ];
        for (chunk, v) in out.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        out
    }
}

/// Result of a single [`Dispatcher::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Linear run: frames execute inline, pass definitions are skipped.
    All,
    /// Top-level only: frame bodies and pass definitions are skipped.
    Init,
    /// Inside a frame or pass body.
    Body,
}

enum Flow {
    Next,
    Jump(usize),
    Call(PassSpan),
    /// The region needed lies beyond the index fault.
    Fault,
}

/// Executes a module's bytecode against a backend.
///
/// Resources persist across runs; context slots (open pass, bound pipeline,
/// active frame) are reset after every run and after every error.
pub struct Dispatcher<B: Backend> {
    module: Module,
    backend: B,
    resources: ResourceTable<B>,
    ctx: Context,
    frame_counter: u64,
    limits: Limits,
    inputs: RuntimeInputs,
    index: Option<FrameIndex>,
    pc: usize,
    fuel: u32,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(module: Module, backend: B) -> Self {
        Self::with_limits(module, backend, Limits::default())
    }

    pub fn with_limits(module: Module, backend: B, limits: Limits) -> Self {
        let (width, height) = backend.output_size();
        Self {
            module,
            backend,
            resources: ResourceTable::new(),
            ctx: Context::default(),
            frame_counter: 0,
            limits,
            inputs: RuntimeInputs {
                time: 0.0,
                width,
                height,
            },
            index: None,
            pc: 0,
            fuel: limits.exec_fuel,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn resources(&self) -> &ResourceTable<B> {
        &self.resources
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Number of frames completed so far.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn inputs(&self) -> &RuntimeInputs {
        &self.inputs
    }

    pub fn set_time(&mut self, time: f32) {
        self.inputs.time = time;
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) {
        self.inputs.width = width;
        self.inputs.height = height;
    }

    /// Offset of the next instruction for [`step`](Self::step).
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Rewind [`step`](Self::step) to offset 0.
    pub fn rewind(&mut self) {
        self.pc = 0;
        self.ctx.reset();
    }

    /// The frame index, built on first use.
    pub fn frame_index(&mut self) -> &FrameIndex {
        self.index
            .get_or_insert_with(|| FrameIndex::build(&self.module))
    }

    /// Frames located by the index, including one cut short by a fault.
    pub fn frame_count(&mut self) -> usize {
        self.frame_index().frames().len()
    }

    pub fn frame_name(&mut self, index: usize) -> Option<String> {
        let span = self.frame_index().frame(index)?;
        self.module.string(span.name).map(str::to_owned)
    }

    fn fault(&self) -> Option<&DispatchError> {
        self.index.as_ref().and_then(FrameIndex::fault)
    }

    /// A frame the index does not hold may sit behind its fault.
    fn missing_frame(&self, what: String) -> DispatchError {
        match self.fault() {
            Some(fault) => fault.clone(),
            None => DispatchError::new(0, None, RuntimeError::FrameNotFound(what)),
        }
    }

    fn check_truncated(&self, truncated: bool) -> Result<(), DispatchError> {
        match self.fault() {
            Some(fault) if truncated => Err(fault.clone()),
            _ => Ok(()),
        }
    }

    /// Write bytes into a created buffer outside of bytecode execution.
    pub fn write_buffer(&mut self, buffer: u32, offset: u32, bytes: &[u8]) -> Result<(), RuntimeError> {
        let slot = self.resources.buffer(buffer)?;
        slot.check_write(buffer, offset, bytes.len())?;
        self.backend.write_buffer(&slot.handle, offset, bytes)?;
        Ok(())
    }

    /// Decode and execute the instruction at [`pc`](Self::pc).
    pub fn step(&mut self) -> Result<Step, DispatchError> {
        self.step_with(&mut NoopTracer)
    }

    pub fn step_with<T: Tracer>(&mut self, tracer: &mut T) -> Result<Step, DispatchError> {
        let len = self.module.bytecode().len();
        if self.pc >= len {
            return Ok(Step::End);
        }
        self.fuel = self.limits.exec_fuel;
        self.frame_index();
        let result = self.exec_at(self.pc, Mode::All, tracer);
        match result {
            Ok(next) => {
                self.pc = next;
                Ok(if next >= len { Step::End } else { Step::Continue })
            }
            Err(e) => Err(self.fail(e, tracer)),
        }
    }

    /// Run the whole stream from offset 0.
    pub fn execute_all(&mut self) -> Result<(), DispatchError> {
        self.execute_all_with(&mut NoopTracer)
    }

    pub fn execute_all_with<T: Tracer>(&mut self, tracer: &mut T) -> Result<(), DispatchError> {
        tracing::debug!(bytes = self.module.bytecode().len(), "executing module");
        self.run(Mode::All, tracer)
    }

    /// Run top-level instructions only, skipping frame bodies and pass
    /// definitions. Used to create resources before the first frame.
    pub fn execute_init(&mut self) -> Result<(), DispatchError> {
        self.execute_init_with(&mut NoopTracer)
    }

    pub fn execute_init_with<T: Tracer>(&mut self, tracer: &mut T) -> Result<(), DispatchError> {
        tracing::debug!("executing init code");
        self.run(Mode::Init, tracer)
    }

    /// Run the body of frame number `index` (definition order).
    pub fn execute_frame(&mut self, index: usize) -> Result<(), DispatchError> {
        self.execute_frame_with(index, &mut NoopTracer)
    }

    pub fn execute_frame_with<T: Tracer>(
        &mut self,
        index: usize,
        tracer: &mut T,
    ) -> Result<(), DispatchError> {
        let Some(span) = self.frame_index().frame(index) else {
            let err = self.missing_frame(format!("#{index}"));
            return Err(self.fail(err, tracer));
        };

        tracing::debug!(frame = span.id, counter = self.frame_counter, "executing frame");
        self.fuel = self.limits.exec_fuel;
        self.ctx.reset();
        self.ctx.frame = Some(span.id);
        tracer.trace_frame_begin(span.id, self.frame_counter);

        let result = self
            .run_range(span.body_start, span.body_end, Mode::Body, tracer)
            .and_then(|()| self.check_truncated(span.truncated))
            .and_then(|()| {
                self.ctx.require_no_pass("end_frame").map_err(|e| {
                    DispatchError::new(span.body_end, Some(Opcode::EndFrame), e)
                })
            });
        if let Err(e) = result {
            return Err(self.fail(e, tracer));
        }

        self.frame_counter += 1;
        self.ctx.reset();
        tracer.trace_frame_end(span.id, self.frame_counter);
        Ok(())
    }

    pub fn execute_frame_by_id(&mut self, id: u32) -> Result<(), DispatchError> {
        self.execute_frame_by_id_with(id, &mut NoopTracer)
    }

    pub fn execute_frame_by_id_with<T: Tracer>(
        &mut self,
        id: u32,
        tracer: &mut T,
    ) -> Result<(), DispatchError> {
        let found = self.frame_index().frame_by_id(id);
        match found {
            Some(index) => self.execute_frame_with(index, tracer),
            None => {
                let err = self.missing_frame(format!("id {id}"));
                Err(self.fail(err, tracer))
            }
        }
    }

    pub fn execute_frame_by_name(&mut self, name: &str) -> Result<(), DispatchError> {
        self.execute_frame_by_name_with(name, &mut NoopTracer)
    }

    pub fn execute_frame_by_name_with<T: Tracer>(
        &mut self,
        name: &str,
        tracer: &mut T,
    ) -> Result<(), DispatchError> {
        self.frame_index();
        let found = self
            .index
            .as_ref()
            .and_then(|i| i.frame_by_name(&self.module, name));
        match found {
            Some(index) => self.execute_frame_with(index, tracer),
            None => {
                let err = self.missing_frame(format!("`{name}`"));
                Err(self.fail(err, tracer))
            }
        }
    }

    fn run<T: Tracer>(&mut self, mode: Mode, tracer: &mut T) -> Result<(), DispatchError> {
        self.fuel = self.limits.exec_fuel;
        self.ctx.reset();
        let len = self.module.bytecode().len();
        self.frame_index();
        let result = self.run_range(0, len, mode, tracer);
        match result {
            Ok(()) => {
                self.ctx.reset();
                Ok(())
            }
            Err(e) => Err(self.fail(e, tracer)),
        }
    }

    fn fail<T: Tracer>(&mut self, err: DispatchError, tracer: &mut T) -> DispatchError {
        self.ctx.reset();
        tracer.trace_error(&err);
        tracing::warn!(
            offset = err.offset,
            opcode = err.opcode.map(Opcode::mnemonic),
            error = %err.kind,
            "dispatch aborted"
        );
        err
    }

    fn run_range<T: Tracer>(
        &mut self,
        start: usize,
        end: usize,
        mode: Mode,
        tracer: &mut T,
    ) -> Result<(), DispatchError> {
        let mut pc = start;
        while pc < end {
            pc = self.exec_at(pc, mode, tracer)?;
        }
        Ok(())
    }

    /// Execute the instruction at `offset`, returning the next offset.
    fn exec_at<T: Tracer>(
        &mut self,
        offset: usize,
        mode: Mode,
        tracer: &mut T,
    ) -> Result<usize, DispatchError> {
        if let Some(fault) = self.fault().filter(|f| f.offset == offset) {
            return Err(fault.clone());
        }
        let bytecode = self.module.bytecode();
        let (instr, len) = decode_instruction(bytecode, offset).map_err(|e| {
            DispatchError::new(offset, bytecode.get(offset).copied().and_then(Opcode::from_u8), e)
        })?;
        let opcode = instr.opcode();

        if self.fuel == 0 {
            return Err(DispatchError::new(
                offset,
                Some(opcode),
                RuntimeError::ExecFuelExhausted(self.limits.exec_fuel),
            ));
        }
        self.fuel -= 1;

        tracer.trace_instruction(offset, &instr);
        tracing::trace!(offset, op = opcode.mnemonic(), "dispatch");

        let flow = self
            .exec(offset, instr, mode, tracer)
            .map_err(|e| DispatchError::new(offset, Some(opcode), e))?;

        match flow {
            Flow::Next => Ok(offset + len),
            Flow::Jump(target) => Ok(target),
            Flow::Fault => Err(self.fault().cloned().unwrap_or_else(|| {
                DispatchError::new(offset, Some(opcode), RuntimeError::Structure("missing region"))
            })),
            Flow::Call(pass) => {
                tracer.trace_pass_enter(pass.id);
                self.run_range(pass.body_start, pass.body_end, Mode::Body, tracer)?;
                self.check_truncated(pass.truncated)?;
                tracer.trace_pass_exit(pass.id);
                Ok(offset + len)
            }
        }
    }

    fn exec<T: Tracer>(
        &mut self,
        offset: usize,
        instr: Instruction,
        mode: Mode,
        tracer: &mut T,
    ) -> Result<Flow, RuntimeError> {
        let Self {
            module,
            backend,
            resources,
            ctx,
            frame_counter,
            limits,
            inputs,
            index,
            ..
        } = self;
        let max_id = limits.max_resource_id;

        match instr {
            Instruction::CreateBuffer {
                buffer,
                size,
                usage,
            } => {
                resources.buffers.check_free(buffer, max_id)?;
                let handle = backend.create_buffer(buffer, &BufferDesc { size, usage })?;
                resources
                    .buffers
                    .insert(buffer, BufferSlot { handle, size }, max_id)?;
            }
            Instruction::CreateTexture {
                texture,
                descriptor,
            } => {
                resources.textures.check_free(texture, max_id)?;
                let desc = TextureDescriptor::decode(data(module, descriptor)?)
                    .map_err(|source| descriptor_error(descriptor, source))?;
                let handle = backend.create_texture(texture, &desc)?;
                resources.textures.insert(texture, handle, max_id)?;
            }
            Instruction::CreateSampler {
                sampler,
                descriptor,
            } => {
                resources.samplers.check_free(sampler, max_id)?;
                let desc = SamplerDescriptor::decode(data(module, descriptor)?)
                    .map_err(|source| descriptor_error(descriptor, source))?;
                let handle = backend.create_sampler(sampler, &desc)?;
                resources.samplers.insert(sampler, handle, max_id)?;
            }
            Instruction::CreateShaderModule { shader, code } => {
                resources.shaders.check_free(shader, max_id)?;
                let source = std::str::from_utf8(data(module, code)?)
                    .map_err(|_| RuntimeError::ShaderUtf8(code))?;
                let handle = backend.create_shader_module(shader, source)?;
                resources.shaders.insert(shader, handle, max_id)?;
            }
            Instruction::CreateRenderPipeline {
                pipeline,
                shader,
                descriptor,
            } => {
                resources.pipelines.check_free(pipeline, max_id)?;
                let desc = RenderPipelineDescriptor::decode(data(module, descriptor)?)
                    .map_err(|source| descriptor_error(descriptor, source))?;
                let desc = RenderPipelineDesc {
                    vertex_entry: string(module, desc.vertex_entry)?,
                    fragment_entry: string(module, desc.fragment_entry)?,
                    topology: desc.topology,
                    format: desc.format,
                };
                let shader = resources.shaders.get(shader)?;
                let handle = backend.create_render_pipeline(pipeline, shader, &desc)?;
                resources
                    .pipelines
                    .insert(pipeline, PipelineSlot::Render(handle), max_id)?;
            }
            Instruction::CreateComputePipeline {
                pipeline,
                shader,
                entry,
            } => {
                resources.pipelines.check_free(pipeline, max_id)?;
                let entry = string(module, StringId(entry))?;
                let shader = resources.shaders.get(shader)?;
                let handle = backend.create_compute_pipeline(pipeline, shader, entry)?;
                resources
                    .pipelines
                    .insert(pipeline, PipelineSlot::Compute(handle), max_id)?;
            }
            Instruction::CreateBindGroup {
                group,
                pipeline,
                index: layout_index,
                entries,
            } => {
                resources.bind_groups.check_free(group, max_id)?;
                let list = decode_bind_entries(data(module, entries)?)
                    .map_err(|source| descriptor_error(entries, source))?;
                let layout = resources.pipeline(pipeline)?;
                let resolved = list
                    .iter()
                    .map(|e| {
                        Ok(BindGroupEntry {
                            binding: e.binding,
                            resource: resolve_binding(resources, e)?,
                        })
                    })
                    .collect::<Result<Vec<_>, RuntimeError>>()?;
                let handle = backend.create_bind_group(group, layout, layout_index, &resolved)?;
                resources.bind_groups.insert(group, handle, max_id)?;
            }

            Instruction::BeginRenderPass {
                color,
                load,
                store,
                depth,
            } => {
                ctx.require_no_pass("begin_render_pass")?;
                let load = LoadOp::from_u8(load).ok_or(invalid("load op", load))?;
                let store = StoreOp::from_u8(store).ok_or(invalid("store op", store))?;
                let color = match BiasedId(color).get() {
                    None => ColorTarget::Default,
                    Some(id) => ColorTarget::Texture(resources.textures.get(id)?),
                };
                let depth = match BiasedId(depth).get() {
                    None => None,
                    Some(id) => Some(resources.textures.get(id)?),
                };
                backend.begin_render_pass(color, load, store, depth)?;
                ctx.open_pass("begin_render_pass", PassKind::Render)?;
            }
            Instruction::BeginComputePass {} => {
                ctx.require_no_pass("begin_compute_pass")?;
                backend.begin_compute_pass()?;
                ctx.open_pass("begin_compute_pass", PassKind::Compute)?;
            }
            Instruction::SetPipeline { pipeline } => {
                let pipeline = resources.pipeline(pipeline)?;
                ctx.bind_pipeline(pipeline.kind())?;
                backend.set_pipeline(pipeline)?;
            }
            Instruction::SetBindGroup { slot, group } => {
                ctx.require_pass("set_bind_group")?;
                backend.set_bind_group(slot, resources.bind_groups.get(group)?)?;
            }
            Instruction::SetVertexBuffer { slot, buffer } => {
                ctx.require_render_pass("set_vertex_buffer")?;
                backend.set_vertex_buffer(slot, &resources.buffer(buffer)?.handle)?;
            }
            Instruction::SetIndexBuffer { buffer, format } => {
                ctx.require_render_pass("set_index_buffer")?;
                let format =
                    IndexFormat::from_u8(format).ok_or(invalid("index format", format))?;
                backend.set_index_buffer(&resources.buffer(buffer)?.handle, format)?;
                ctx.index_buffer = true;
            }
            Instruction::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                ctx.require_render_pass("draw")?;
                ctx.require_pipeline("draw", PipelineKind::Render)?;
                backend.draw(DrawArgs {
                    vertex_count,
                    instance_count,
                    first_vertex,
                    first_instance,
                })?;
            }
            Instruction::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                base_vertex,
                first_instance,
            } => {
                ctx.require_render_pass("draw_indexed")?;
                ctx.require_pipeline("draw_indexed", PipelineKind::Render)?;
                if !ctx.index_buffer {
                    return Err(RuntimeError::InvalidState {
                        op: "draw_indexed",
                        reason: "without an index buffer",
                    });
                }
                backend.draw_indexed(DrawIndexedArgs {
                    index_count,
                    instance_count,
                    first_index,
                    base_vertex,
                    first_instance,
                })?;
            }
            Instruction::Dispatch { x, y, z } => {
                if ctx.require_pass("dispatch")? != PassKind::Compute {
                    return Err(RuntimeError::InvalidState {
                        op: "dispatch",
                        reason: "inside a render pass",
                    });
                }
                ctx.require_pipeline("dispatch", PipelineKind::Compute)?;
                backend.dispatch(x, y, z)?;
            }
            Instruction::EndPass {} => {
                ctx.require_pass("end_pass")?;
                backend.end_pass()?;
                ctx.close_pass()?;
            }

            Instruction::WriteBuffer {
                buffer,
                offset: at,
                data: blob,
            } => {
                let bytes = data(module, blob)?;
                let slot = resources.buffer(buffer)?;
                slot.check_write(buffer, at, bytes.len())?;
                backend.write_buffer(&slot.handle, at, bytes)?;
            }
            Instruction::WriteTimeUniform {
                buffer,
                offset: at,
                size,
            } => {
                if !matches!(size, 4 | 8 | 12 | 16) {
                    return Err(RuntimeError::TimeUniformSize(size));
                }
                let block = inputs.time_block();
                let bytes = &block[..size as usize];
                let slot = resources.buffer(buffer)?;
                slot.check_write(buffer, at, bytes.len())?;
                backend.write_buffer(&slot.handle, at, bytes)?;
            }
            Instruction::Submit {} => {
                ctx.require_no_pass("submit")?;
                backend.submit()?;
            }

            Instruction::DefineFrame { frame, .. } => match mode {
                Mode::Init => {
                    let span = index.as_ref().and_then(|i| i.frame_at(offset));
                    let span = span.ok_or(RuntimeError::Structure("frame missing from index"))?;
                    return Ok(Flow::Jump(span.end));
                }
                Mode::All => {
                    ctx.require_no_pass("define_frame")?;
                    ctx.frame = Some(frame);
                    tracer.trace_frame_begin(frame, *frame_counter);
                }
                Mode::Body => return Err(RuntimeError::Structure("nested frame")),
            },
            Instruction::EndFrame {} => {
                if mode != Mode::All {
                    return Err(RuntimeError::Structure("end_frame outside a frame"));
                }
                ctx.require_no_pass("end_frame")?;
                let frame = ctx.frame.take();
                *frame_counter += 1;
                ctx.reset();
                if let Some(frame) = frame {
                    tracer.trace_frame_end(frame, *frame_counter);
                }
            }
            Instruction::DefinePass { .. } => {
                if mode == Mode::Body {
                    return Err(RuntimeError::Structure("nested pass definition"));
                }
                let span = index.as_ref().and_then(|i| i.pass_at(offset));
                let span = span.ok_or(RuntimeError::Structure("pass missing from index"))?;
                return Ok(Flow::Jump(span.end));
            }
            Instruction::EndPassDef {} => {
                return Err(RuntimeError::Structure("end_pass_def without define_pass"));
            }
            Instruction::ExecPass { pass } => {
                let index = index.as_ref();
                return match index.and_then(|i| i.pass(pass)) {
                    Some(span) => Ok(Flow::Call(span)),
                    None if index.and_then(FrameIndex::fault).is_some() => Ok(Flow::Fault),
                    None => Err(RuntimeError::UnknownPass(pass)),
                };
            }

            Instruction::SetVertexBufferPool {
                slot,
                base,
                pool,
                offset: shift,
            } => {
                ctx.require_render_pass("set_vertex_buffer_pool")?;
                let id = pool_target(*frame_counter, base, pool, shift, offset)?;
                backend.set_vertex_buffer(slot, &resources.buffer(id)?.handle)?;
            }
            Instruction::SetBindGroupPool {
                slot,
                base,
                pool,
                offset: shift,
            } => {
                ctx.require_pass("set_bind_group_pool")?;
                let id = pool_target(*frame_counter, base, pool, shift, offset)?;
                backend.set_bind_group(slot, resources.bind_groups.get(id)?)?;
            }

            Instruction::CreateTypedArray {
                array,
                element,
                count,
            } => {
                resources.arrays.check_free(array, max_id)?;
                let element =
                    ElementType::from_u8(element).ok_or(invalid("element type", element))?;
                if count > limits.max_array_elements {
                    return Err(DataGenError::TooLarge {
                        count,
                        limit: limits.max_array_elements,
                    }
                    .into());
                }
                resources
                    .arrays
                    .insert(array, TypedArray::new(element, count), max_id)?;
            }
            Instruction::FillConstant {
                array,
                offset: first,
                count,
                stride,
                value,
            } => {
                let value = data_f32(module, value)?;
                let range = FillRange {
                    offset: first,
                    count,
                    stride,
                };
                resources.arrays.get_mut(array)?.fill_constant(range, value)?;
            }
            Instruction::FillLinear {
                array,
                offset: first,
                count,
                stride,
                start,
                step,
            } => {
                let start = data_f32(module, start)?;
                let step = data_f32(module, step)?;
                let range = FillRange {
                    offset: first,
                    count,
                    stride,
                };
                resources.arrays.get_mut(array)?.fill_linear(range, start, step)?;
            }
            Instruction::FillElementIndex {
                array,
                offset: first,
                count,
                stride,
                scale,
                bias,
            } => {
                let scale = data_f32(module, scale)?;
                let bias = data_f32(module, bias)?;
                let range = FillRange {
                    offset: first,
                    count,
                    stride,
                };
                resources
                    .arrays
                    .get_mut(array)?
                    .fill_element_index(range, scale, bias)?;
            }
            Instruction::FillRandom {
                array,
                offset: first,
                count,
                stride,
                seed,
                min,
                max,
            } => {
                let seed = data_u32(module, seed)?;
                let min = data_f32(module, min)?;
                let max = data_f32(module, max)?;
                let range = FillRange {
                    offset: first,
                    count,
                    stride,
                };
                resources
                    .arrays
                    .get_mut(array)?
                    .fill_random(range, seed, min, max)?;
            }
            Instruction::FillExpression {
                array,
                offset: first,
                count,
                stride,
                expr,
            } => {
                let program = ExprProgram::parse(data(module, expr)?, limits.max_expr_stack)
                    .map_err(|source| RuntimeError::Expr { data: expr, source })?;
                let range = FillRange {
                    offset: first,
                    count,
                    stride,
                };
                resources
                    .arrays
                    .get_mut(array)?
                    .fill_expression(range, &program)?;
            }
            Instruction::WriteBufferFromArray {
                buffer,
                offset: at,
                array,
            } => {
                let bytes = resources.arrays.get(array)?.to_le_bytes();
                let slot = resources.buffer(buffer)?;
                slot.check_write(buffer, at, bytes.len())?;
                backend.write_buffer(&slot.handle, at, &bytes)?;
            }

            Instruction::Nop {} => {}
        }

        Ok(Flow::Next)
    }
}

fn data(module: &Module, id: u32) -> Result<&[u8], RuntimeError> {
    module
        .data_entry(DataId(id))
        .ok_or(RuntimeError::MissingData(id))
}

fn string(module: &Module, id: StringId) -> Result<&str, RuntimeError> {
    module
        .string(id)
        .ok_or(RuntimeError::MissingString(id.get()))
}

fn word(module: &Module, id: u32, what: &'static str) -> Result<[u8; 4], RuntimeError> {
    let bytes = data(module, id)?;
    bytes.try_into().map_err(|_| RuntimeError::DataSize {
        what,
        data: id,
        expected: 4,
        actual: bytes.len(),
    })
}

fn data_f32(module: &Module, id: u32) -> Result<f32, RuntimeError> {
    word(module, id, "an f32 value").map(f32::from_le_bytes)
}

fn data_u32(module: &Module, id: u32) -> Result<u32, RuntimeError> {
    word(module, id, "a u32 value").map(u32::from_le_bytes)
}

fn descriptor_error(data: u32, source: DecodeError) -> RuntimeError {
    RuntimeError::Descriptor { data, source }
}

fn invalid(what: &'static str, value: u8) -> RuntimeError {
    RuntimeError::InvalidEnum {
        what,
        value: value.into(),
    }
}

/// Resource selected by a pool instruction: `base + (counter + shift) % pool`.
fn pool_target(
    counter: u64,
    base: u32,
    pool: u8,
    shift: u8,
    at: usize,
) -> Result<u32, RuntimeError> {
    if pool == 0 {
        return Err(DecodeError::InvalidValue {
            what: "pool size",
            value: 0,
            offset: at,
        }
        .into());
    }
    let slot = (counter + u64::from(shift)) % u64::from(pool);
    // `slot < 256` and varint operands stay below 2^30.
    Ok(base + slot as u32)
}

fn resolve_binding<'r, B: Backend>(
    resources: &'r ResourceTable<B>,
    entry: &BindEntry,
) -> Result<BindResource<'r, B>, RuntimeError> {
    match entry.kind {
        BindingKind::UniformBuffer
        | BindingKind::StorageBuffer
        | BindingKind::ReadOnlyStorageBuffer => {
            let slot = resources.buffer(entry.resource)?;
            let size = slot.bind_size(entry.resource, entry.offset, entry.size)?;
            Ok(BindResource::Buffer {
                buffer: &slot.handle,
                kind: entry.kind,
                offset: entry.offset,
                size,
            })
        }
        BindingKind::Texture => Ok(BindResource::Texture(
            resources.textures.get(entry.resource)?,
        )),
        BindingKind::Sampler => Ok(BindResource::Sampler(
            resources.samplers.get(entry.resource)?,
        )),
    }
}
