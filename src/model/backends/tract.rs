#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::frame::Frame;
use crate::model::backend::{InputShape, OutputSpace, PoseBackend, TensorLayout};
use crate::model::PixelNormalization;
use crate::pose::TupleLayout;

/// Tract-based backend for ONNX single-pose models.
///
/// Loads a local model file once; each `infer` resizes the frame to the
/// declared input by nearest-neighbour sampling and returns output 0 flattened.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input: InputShape,
    normalization: PixelNormalization,
    layout: TupleLayout,
    space: OutputSpace,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input: InputShape) -> Result<Self> {
        let model_path = model_path.as_ref();
        let (w, h) = (input.width as usize, input.height as usize);
        let shape = match input.layout {
            TensorLayout::Nhwc => tvec!(1, h, w, 3),
            TensorLayout::Nchw => tvec!(1, 3, h, w),
        };
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input,
            normalization: PixelNormalization::default(),
            layout: TupleLayout::default(),
            space: OutputSpace::default(),
        })
    }

    pub fn with_normalization(mut self, normalization: PixelNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_output(mut self, layout: TupleLayout, space: OutputSpace) -> Self {
        self.layout = layout;
        self.space = space;
        self
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let (w, h) = (self.input.width as usize, self.input.height as usize);
        if w == 0 || h == 0 {
            return Err(anyhow!("model input shape must be non-zero"));
        }
        let sample = |x: usize, y: usize, channel: usize| -> f32 {
            let sx = (x * frame.width as usize / w) as u32;
            let sy = (y * frame.height as usize / h) as u32;
            self.normalization.apply(frame.rgb_at(sx, sy)[channel])
        };

        let tensor = match self.input.layout {
            TensorLayout::Nhwc => {
                tract_ndarray::Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| sample(x, y, c))
                    .into_tensor()
            }
            TensorLayout::Nchw => {
                tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| sample(x, y, c))
                    .into_tensor()
            }
        };
        Ok(tensor)
    }
}

impl PoseBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_shape(&self) -> InputShape {
        self.input
    }

    fn output_layout(&self) -> TupleLayout {
        self.layout
    }

    fn output_space(&self) -> OutputSpace {
        self.space
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<f32>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let values = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(values.iter().copied().collect())
    }
}
