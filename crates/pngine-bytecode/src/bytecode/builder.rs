//! Programmatic module construction.
//!
//! Used by the assembler and by tests. Strings are interned, identical data
//! blobs share one entry, and capabilities are derived from the emitted
//! bytecode on [`finish`](ModuleBuilder::finish).

use indexmap::IndexSet;

use super::capabilities::Capabilities;
use super::codec;
use super::constants::VERSION;
use super::error::EncodeError;
use super::ids::{DataId, StringId};
use super::instructions::Instruction;
use super::module::{Module, ModuleError};
use super::reflection::{
    AnimationTable, EndBehavior, SceneEntry, UniformField, UniformType, WgslEntry,
};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    strings: IndexSet<String>,
    data: IndexSet<Vec<u8>>,
    wgsl: Vec<WgslEntry>,
    uniforms: Vec<UniformField>,
    animation: Option<AnimationTable>,
    bytecode: Vec<u8>,
    interpreter: Vec<u8>,
    declared: Capabilities,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(idx) = self.strings.get_index_of(s) {
            return StringId(idx as u32);
        }
        let (idx, _) = self.strings.insert_full(s.to_owned());
        StringId(idx as u32)
    }

    pub fn add_data(&mut self, bytes: impl Into<Vec<u8>>) -> DataId {
        let (idx, _) = self.data.insert_full(bytes.into());
        DataId(idx as u32)
    }

    pub fn add_f32(&mut self, value: f32) -> DataId {
        self.add_data(value.to_le_bytes())
    }

    pub fn add_u32(&mut self, value: u32) -> DataId {
        self.add_data(value.to_le_bytes())
    }

    /// Register a named WGSL source; returns its data entry.
    pub fn add_wgsl(&mut self, name: &str, source: &str) -> DataId {
        let name = self.intern(name);
        let data = self.add_data(source.as_bytes());
        self.add_wgsl_entry(name, data);
        data
    }

    pub fn add_wgsl_entry(&mut self, name: StringId, data: DataId) -> &mut Self {
        self.wgsl.push(WgslEntry { name, data });
        self
    }

    pub fn add_uniform(
        &mut self,
        name: &str,
        buffer: u32,
        offset: u32,
        ty: UniformType,
    ) -> &mut Self {
        let name = self.intern(name);
        self.add_uniform_field(name, buffer, offset, ty)
    }

    pub fn add_uniform_field(
        &mut self,
        name: StringId,
        buffer: u32,
        offset: u32,
        ty: UniformType,
    ) -> &mut Self {
        self.uniforms.push(UniformField {
            name,
            buffer,
            offset,
            size: ty.byte_size(),
            ty,
        });
        self
    }

    pub fn set_animation(
        &mut self,
        duration: f32,
        looping: bool,
        end_behavior: EndBehavior,
    ) -> &mut Self {
        let scenes = self.animation.take().map(|a| a.scenes).unwrap_or_default();
        self.animation = Some(AnimationTable {
            duration,
            looping,
            end_behavior,
            scenes,
        });
        self
    }

    /// Append a scene. Creates a default animation table when none is set.
    pub fn add_scene(&mut self, name: &str, frame: &str, start: f32, end: f32) -> &mut Self {
        let name = self.intern(name);
        let frame = self.intern(frame);
        self.add_scene_entry(name, frame, start, end)
    }

    pub fn add_scene_entry(
        &mut self,
        name: StringId,
        frame: StringId,
        start: f32,
        end: f32,
    ) -> &mut Self {
        self.animation
            .get_or_insert_with(AnimationTable::default)
            .scenes
            .push(SceneEntry {
                name,
                frame,
                start,
                end,
            });
        self
    }

    pub fn set_interpreter(&mut self, blob: Vec<u8>) -> &mut Self {
        self.interpreter = blob;
        self
    }

    /// Declare capabilities beyond what the bytecode implies.
    pub fn declare(&mut self, caps: Capabilities) -> &mut Self {
        self.declared.insert(caps);
        self
    }

    /// Append one instruction; returns its byte offset.
    pub fn emit(&mut self, instr: Instruction) -> Result<usize, EncodeError> {
        let at = self.bytecode.len();
        codec::encode(&instr, &mut self.bytecode)?;
        Ok(at)
    }

    pub fn emit_all(
        &mut self,
        instrs: impl IntoIterator<Item = Instruction>,
    ) -> Result<(), EncodeError> {
        for instr in instrs {
            self.emit(instr)?;
        }
        Ok(())
    }

    /// Append pre-encoded bytecode verbatim.
    pub fn emit_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytecode.extend_from_slice(bytes);
        self
    }

    pub fn bytecode_len(&self) -> usize {
        self.bytecode.len()
    }

    /// Build the module. Reflection references are checked here; bytecode is
    /// only checked when dispatched, so raw streams that fail to decode still
    /// produce a module (with whatever capabilities were declared).
    pub fn finish(self) -> Result<Module, ModuleError> {
        let mut capabilities = Capabilities::scan(&self.bytecode).unwrap_or_default();
        capabilities.insert(self.declared);
        if self.animation.is_some() {
            capabilities.insert(Capabilities::ANIMATION);
        }

        let module = Module {
            version: VERSION,
            capabilities,
            strings: self.strings.into_iter().collect(),
            data: self.data.into_iter().collect(),
            wgsl: self.wgsl,
            uniforms: self.uniforms,
            animation: self.animation,
            bytecode: self.bytecode,
            interpreter: self.interpreter,
        };
        module.validate_references()?;
        Ok(module)
    }
}
