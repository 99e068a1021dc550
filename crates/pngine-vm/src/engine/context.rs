//! Per-run context slots.

use super::backend::PipelineKind;
use super::error::RuntimeError;

/// Kind of the currently open pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    Render,
    Compute,
}

/// Pass and binding state, reset between frames and after errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub pass: Option<PassKind>,
    pub pipeline: Option<PipelineKind>,
    pub frame: Option<u32>,
    pub index_buffer: bool,
}

impl Context {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn open_pass(&mut self, op: &'static str, kind: PassKind) -> Result<(), RuntimeError> {
        if self.pass.is_some() {
            return Err(state(op, "inside an open pass"));
        }
        self.pass = Some(kind);
        Ok(())
    }

    pub fn close_pass(&mut self) -> Result<(), RuntimeError> {
        if self.pass.take().is_none() {
            return Err(state("end_pass", "without an open pass"));
        }
        self.pipeline = None;
        self.index_buffer = false;
        Ok(())
    }

    pub fn require_pass(&self, op: &'static str) -> Result<PassKind, RuntimeError> {
        self.pass.ok_or(state(op, "outside a pass"))
    }

    pub fn require_render_pass(&self, op: &'static str) -> Result<(), RuntimeError> {
        match self.require_pass(op)? {
            PassKind::Render => Ok(()),
            PassKind::Compute => Err(state(op, "inside a compute pass")),
        }
    }

    pub fn require_no_pass(&self, op: &'static str) -> Result<(), RuntimeError> {
        match self.pass {
            Some(_) => Err(state(op, "inside an open pass")),
            None => Ok(()),
        }
    }

    /// Check a pipeline of `kind` may be bound in the current pass.
    pub fn bind_pipeline(&mut self, kind: PipelineKind) -> Result<(), RuntimeError> {
        let matches = match (self.require_pass("set_pipeline")?, kind) {
            (PassKind::Render, PipelineKind::Render) => true,
            (PassKind::Compute, PipelineKind::Compute) => true,
            _ => false,
        };
        if !matches {
            return Err(state("set_pipeline", "pipeline kind does not match the pass"));
        }
        self.pipeline = Some(kind);
        Ok(())
    }

    pub fn require_pipeline(
        &self,
        op: &'static str,
        kind: PipelineKind,
    ) -> Result<(), RuntimeError> {
        if self.pipeline == Some(kind) {
            Ok(())
        } else {
            Err(state(op, "without a bound pipeline"))
        }
    }
}

fn state(op: &'static str, reason: &'static str) -> RuntimeError {
    RuntimeError::InvalidState { op, reason }
}
