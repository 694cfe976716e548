use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::pose::TupleLayout;

/// Memory order of the model's image input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    #[default]
    Nhwc,
    Nchw,
}

/// Declared image input of a pose model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
}

impl InputShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Coordinate space of the keypoints a model emits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSpace {
    /// Fractions of the input image, in [0, 1].
    #[default]
    Normalized,
    /// Pixels of the resized input tensor.
    InputPixels,
}

/// Pose estimation runtime.
///
/// Implementations own the loaded model and run it on one frame at a time.
/// The frame is read-only and must not be retained past `infer`.
pub trait PoseBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    fn input_shape(&self) -> InputShape;

    fn output_layout(&self) -> TupleLayout;

    fn output_space(&self) -> OutputSpace;

    /// Run the model and return its raw flat output buffer.
    fn infer(&mut self, frame: &Frame) -> Result<Vec<f32>>;

    /// Optional warm-up hook, run once by `ModelHandle::load`.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
