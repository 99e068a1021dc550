//! Host-facing session: load a module, query its reflection tables, render.
//!
//! A session owns one backend for its whole life. Loading a module wraps
//! the backend in a [`Dispatcher`] and runs the module's init code; a failed
//! load leaves the session empty with the backend retained.

use pngine_bytecode::bytecode::{Module, ModuleError, SceneEntry, StringId, UniformType};

use crate::engine::{
    Backend, DispatchError, Dispatcher, Limits, ResourceError, RuntimeError,
};

/// Host-visible errors with stable numeric codes.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no module loaded")]
    NotLoaded,
    #[error("{what} `{name}` not found")]
    NotFound { what: &'static str, name: String },
    #[error("uniform `{name}` takes {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u32,
        actual: usize,
    },
    #[error("{what} index {index} out of range ({count} available)")]
    OutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },
    #[error("{0} must be non-zero")]
    ZeroSize(&'static str),
    #[error("buffer {0} has not been created")]
    NotCreated(u32),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl HostError {
    pub fn code(&self) -> u32 {
        match self {
            Self::NotLoaded => 1,
            Self::NotFound { .. } => 2,
            Self::SizeMismatch { .. } => 3,
            Self::OutOfRange { .. } => 4,
            Self::ZeroSize(_) => 5,
            Self::NotCreated(_) => 6,
            Self::Dispatch(_) => 7,
            Self::Module(_) => 8,
        }
    }
}

/// Resolved uniform-table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformInfo {
    pub name: String,
    pub buffer: u32,
    pub offset: u32,
    pub size: u32,
    pub ty: UniformType,
}

/// What [`Session::render`] executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rendered {
    /// The frame of this scene index.
    Scene(usize),
    /// The module has no animation table; frame 0 ran.
    FirstFrame,
    /// No scene covers the requested time.
    Nothing,
}

pub struct Session<B: Backend> {
    // The backend lives in exactly one of these two slots.
    loaded: Option<Dispatcher<B>>,
    idle: Option<B>,
    limits: Limits,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self::with_limits(backend, Limits::default())
    }

    pub fn with_limits(backend: B, limits: Limits) -> Self {
        Self {
            loaded: None,
            idle: Some(backend),
            limits,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn backend(&self) -> Option<&B> {
        match &self.loaded {
            Some(d) => Some(d.backend()),
            None => self.idle.as_ref(),
        }
    }

    fn release(&mut self) -> Option<B> {
        match self.loaded.take() {
            Some(d) => Some(d.into_backend()),
            None => self.idle.take(),
        }
    }

    /// Drop the loaded module and its resources.
    pub fn unload(&mut self) {
        if let Some(d) = self.loaded.take() {
            self.idle = Some(d.into_backend());
        }
    }

    /// Deserialize and load a module file.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        match Module::from_bytes(bytes) {
            Ok(module) => self.load_module(module),
            Err(e) => {
                self.unload();
                Err(e.into())
            }
        }
    }

    /// Load `module` and run its init code.
    pub fn load_module(&mut self, module: Module) -> Result<(), HostError> {
        let backend = self.release().ok_or(HostError::NotLoaded)?;
        let mut dispatcher = Dispatcher::with_limits(module, backend, self.limits);

        if let Err(e) = dispatcher.execute_init() {
            self.idle = Some(dispatcher.into_backend());
            return Err(e.into());
        }

        tracing::debug!(
            bytes = dispatcher.module().bytecode().len(),
            resources = dispatcher.resources().len(),
            "module loaded"
        );
        self.loaded = Some(dispatcher);
        Ok(())
    }

    pub fn dispatcher(&self) -> Result<&Dispatcher<B>, HostError> {
        self.loaded.as_ref().ok_or(HostError::NotLoaded)
    }

    pub fn dispatcher_mut(&mut self) -> Result<&mut Dispatcher<B>, HostError> {
        self.loaded.as_mut().ok_or(HostError::NotLoaded)
    }

    pub fn module(&self) -> Result<&Module, HostError> {
        Ok(self.dispatcher()?.module())
    }

    pub fn set_time(&mut self, time: f32) -> Result<(), HostError> {
        self.dispatcher_mut()?.set_time(time);
        Ok(())
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) -> Result<(), HostError> {
        if width == 0 {
            return Err(HostError::ZeroSize("output width"));
        }
        if height == 0 {
            return Err(HostError::ZeroSize("output height"));
        }
        self.dispatcher_mut()?.set_output_size(width, height);
        Ok(())
    }

    /// Width and height seen by bytecode, initially the backend's surface size.
    pub fn output_size(&self) -> Result<(u32, u32), HostError> {
        let inputs = self.dispatcher()?.inputs();
        Ok((inputs.width, inputs.height))
    }

    // Uniforms

    pub fn uniform_count(&self) -> Result<usize, HostError> {
        Ok(self.module()?.uniforms().len())
    }

    pub fn uniform_info(&self, index: usize) -> Result<UniformInfo, HostError> {
        let module = self.module()?;
        let count = module.uniforms().len();
        let field = module.uniforms().get(index).ok_or(HostError::OutOfRange {
            what: "uniform",
            index,
            count,
        })?;
        Ok(UniformInfo {
            name: module.string(field.name).unwrap_or_default().to_owned(),
            buffer: field.buffer,
            offset: field.offset,
            size: field.size,
            ty: field.ty,
        })
    }

    pub fn uniform_name(&self, index: usize) -> Result<String, HostError> {
        Ok(self.uniform_info(index)?.name)
    }

    pub fn uniform_type(&self, index: usize) -> Result<UniformType, HostError> {
        Ok(self.uniform_info(index)?.ty)
    }

    /// Write `bytes` into the buffer slot backing uniform `name`.
    pub fn set_uniform(&mut self, name: &str, bytes: &[u8]) -> Result<(), HostError> {
        let dispatcher = self.loaded.as_mut().ok_or(HostError::NotLoaded)?;
        let module = dispatcher.module();
        let field = module
            .uniforms()
            .iter()
            .find(|f| module.string(f.name) == Some(name))
            .copied()
            .ok_or_else(|| HostError::NotFound {
                what: "uniform",
                name: name.to_owned(),
            })?;
        if bytes.len() != field.size as usize {
            return Err(HostError::SizeMismatch {
                name: name.to_owned(),
                expected: field.size,
                actual: bytes.len(),
            });
        }

        dispatcher
            .write_buffer(field.buffer, field.offset, bytes)
            .map_err(|e| match e {
                RuntimeError::Resource(ResourceError::NotCreated { id, .. }) => {
                    HostError::NotCreated(id)
                }
                other => HostError::Dispatch(DispatchError::new(0, None, other)),
            })
    }

    // Scenes

    pub fn scene_count(&self) -> Result<usize, HostError> {
        Ok(self.module()?.animation().map_or(0, |a| a.scenes.len()))
    }

    fn scene(&self, index: usize) -> Result<(&Module, SceneEntry), HostError> {
        let module = self.module()?;
        let scenes = module.animation().map_or(&[][..], |a| &a.scenes[..]);
        let scene = scenes.get(index).copied().ok_or(HostError::OutOfRange {
            what: "scene",
            index,
            count: scenes.len(),
        })?;
        Ok((module, scene))
    }

    pub fn scene_name(&self, index: usize) -> Result<String, HostError> {
        let (module, scene) = self.scene(index)?;
        Ok(string(module, scene.name))
    }

    /// Name of the frame shown by scene `index`.
    pub fn scene_frame(&self, index: usize) -> Result<String, HostError> {
        let (module, scene) = self.scene(index)?;
        Ok(string(module, scene.frame))
    }

    pub fn scene_time_range(&self, index: usize) -> Result<(f32, f32), HostError> {
        let (_, scene) = self.scene(index)?;
        Ok((scene.start, scene.end))
    }

    pub fn scene_at(&self, time: f32) -> Result<Option<usize>, HostError> {
        Ok(self.module()?.animation().and_then(|a| a.scene_at(time)))
    }

    // Frames

    pub fn frame_count(&mut self) -> Result<usize, HostError> {
        Ok(self.dispatcher_mut()?.frame_count())
    }

    pub fn frame_name(&mut self, index: usize) -> Result<String, HostError> {
        let count = self.frame_count()?;
        self.dispatcher_mut()?
            .frame_name(index)
            .ok_or(HostError::OutOfRange {
                what: "frame",
                index,
                count,
            })
    }

    pub fn execute_all(&mut self) -> Result<(), HostError> {
        Ok(self.dispatcher_mut()?.execute_all()?)
    }

    pub fn execute_frame(&mut self, index: usize) -> Result<(), HostError> {
        let count = self.frame_count()?;
        if index >= count {
            return Err(HostError::OutOfRange {
                what: "frame",
                index,
                count,
            });
        }
        Ok(self.dispatcher_mut()?.execute_frame(index)?)
    }

    pub fn execute_frame_by_name(&mut self, name: &str) -> Result<(), HostError> {
        match self.dispatcher_mut()?.execute_frame_by_name(name) {
            Err(e) if matches!(e.kind, RuntimeError::FrameNotFound(_)) => Err(HostError::NotFound {
                what: "frame",
                name: name.to_owned(),
            }),
            result => Ok(result?),
        }
    }

    /// Render the scene active at `time`.
    ///
    /// Without an animation table the first frame is rendered at any time.
    pub fn render(&mut self, time: f32) -> Result<Rendered, HostError> {
        let target = {
            let module = self.module()?;
            module.animation().map(|animation| {
                animation
                    .scene_at(time)
                    .map(|scene| (scene, string(module, animation.scenes[scene].frame)))
            })
        };

        match target {
            None => {
                if self.frame_count()? == 0 {
                    return Ok(Rendered::Nothing);
                }
                self.set_time(time)?;
                self.execute_frame(0)?;
                Ok(Rendered::FirstFrame)
            }
            Some(None) => Ok(Rendered::Nothing),
            Some(Some((scene, frame))) => {
                tracing::debug!(time, scene, frame = %frame, "render");
                self.set_time(time)?;
                self.execute_frame_by_name(&frame)?;
                Ok(Rendered::Scene(scene))
            }
        }
    }
}

fn string(module: &Module, id: StringId) -> String {
    module.string(id).unwrap_or_default().to_owned()
}
