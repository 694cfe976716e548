use std::fmt;

use anyhow::{anyhow, Context, Result};

use super::backend::{InputShape, OutputSpace, PoseBackend};
use crate::error::PoseError;
use crate::frame::Frame;
use crate::pose::TupleLayout;

/// Lifecycle of a model handle: `Unloaded → Ready ⇄ InUse → Released`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Ready,
    InUse,
    Released,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelState::Unloaded => "unloaded",
            ModelState::Ready => "ready",
            ModelState::InUse => "in-use",
            ModelState::Released => "released",
        })
    }
}

/// Raw output of one inference plus what is needed to interpret it.
#[derive(Clone, Debug)]
pub struct ModelOutput {
    pub values: Vec<f32>,
    pub layout: TupleLayout,
    pub space: OutputSpace,
    pub input: InputShape,
}

/// Explicitly owned model handle.
///
/// The application shell creates one, loads a backend into it, feeds frames
/// and releases it when the session ends.
pub struct ModelHandle {
    state: ModelState,
    backend: Option<Box<dyn PoseBackend>>,
}

impl ModelHandle {
    pub fn new() -> Self {
        Self {
            state: ModelState::Unloaded,
            backend: None,
        }
    }

    /// Create a handle and load `backend` into it.
    pub fn loaded(backend: Box<dyn PoseBackend>) -> Result<Self> {
        let mut handle = Self::new();
        handle.load(backend)?;
        Ok(handle)
    }

    pub fn load(&mut self, mut backend: Box<dyn PoseBackend>) -> Result<()> {
        match self.state {
            ModelState::Unloaded => {}
            ModelState::Released => return Err(anyhow!("model handle already released")),
            ModelState::Ready | ModelState::InUse => {
                return Err(anyhow!("model handle already holds a backend"))
            }
        }
        backend
            .warm_up()
            .with_context(|| format!("warm-up failed for backend {}", backend.name()))?;
        log::info!(
            "model loaded: backend={} input={}x{}",
            backend.name(),
            backend.input_shape().width,
            backend.input_shape().height
        );
        self.backend = Some(backend);
        self.state = ModelState::Ready;
        Ok(())
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ModelState::Ready
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    pub fn input_shape(&self) -> Option<InputShape> {
        self.backend.as_ref().map(|b| b.input_shape())
    }

    /// Run the loaded model on `frame`.
    ///
    /// Fails with `PoseError::ModelUninitialized` unless the handle is `Ready`.
    pub fn infer(&mut self, frame: &Frame) -> Result<ModelOutput> {
        if self.state != ModelState::Ready {
            return Err(PoseError::ModelUninitialized(self.state).into());
        }
        let Some(backend) = self.backend.as_mut() else {
            return Err(PoseError::ModelUninitialized(self.state).into());
        };

        self.state = ModelState::InUse;
        let result = backend.infer(frame);
        self.state = ModelState::Ready;

        let values = result.with_context(|| {
            format!(
                "pose inference failed on frame {} ({})",
                frame.sequence,
                backend.name()
            )
        })?;
        Ok(ModelOutput {
            values,
            layout: backend.output_layout(),
            space: backend.output_space(),
            input: backend.input_shape(),
        })
    }

    /// Drop the backend. The handle cannot be reused afterwards.
    pub fn release(&mut self) {
        if let Some(backend) = self.backend.take() {
            log::info!("model released: backend={}", backend.name());
        }
        self.state = ModelState::Released;
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new()
    }
}
