//! Pose estimation runtime boundary.
//!
//! The model itself is an opaque pre-trained file; this module only owns its
//! lifecycle and the per-frame call into it.

mod backend;
pub mod backends;
mod handle;

pub use backend::{InputShape, OutputSpace, PoseBackend, TensorLayout};
pub use backends::{SyntheticBackend, SyntheticMotion};
pub use handle::{ModelHandle, ModelOutput, ModelState};

use anyhow::Result;
#[cfg(not(feature = "backend-tract"))]
use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::config::{BackendKind, ModelSettings};

/// Pixel scaling applied when building the model input tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelNormalization {
    /// 0..=255 as-is.
    #[default]
    Raw,
    /// `v / 255`, into [0, 1].
    Unit,
    /// `v / 127.5 - 1`, into [-1, 1].
    Symmetric,
}

impl PixelNormalization {
    pub fn apply(self, value: u8) -> f32 {
        let v = value as f32;
        match self {
            PixelNormalization::Raw => v,
            PixelNormalization::Unit => v / 255.0,
            PixelNormalization::Symmetric => v / 127.5 - 1.0,
        }
    }
}

/// Construct the configured backend. The caller loads it into a `ModelHandle`.
pub fn open_backend(settings: &ModelSettings) -> Result<Box<dyn PoseBackend>> {
    match settings.backend {
        BackendKind::Synthetic => Ok(Box::new(SyntheticBackend::new(settings.motion.clone()))),
        BackendKind::Tract => open_tract(settings),
    }
}

#[cfg(feature = "backend-tract")]
fn open_tract(settings: &ModelSettings) -> Result<Box<dyn PoseBackend>> {
    let path = settings
        .path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("model.path is required for the tract backend"))?;
    let backend = backends::TractBackend::new(path, settings.input)?
        .with_normalization(settings.normalization)
        .with_output(settings.output_layout, settings.output_space);
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn open_tract(_settings: &ModelSettings) -> Result<Box<dyn PoseBackend>> {
    Err(anyhow!("tract backend requires the backend-tract feature"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ranges() {
        assert_eq!(PixelNormalization::Raw.apply(255), 255.0);
        assert_eq!(PixelNormalization::Unit.apply(255), 1.0);
        assert_eq!(PixelNormalization::Symmetric.apply(0), -1.0);
        assert_eq!(PixelNormalization::Symmetric.apply(255), 1.0);
    }

    #[test]
    fn synthetic_backend_opens_without_model_file() {
        let backend = open_backend(&ModelSettings::default()).unwrap();
        assert_eq!(backend.name(), "synthetic");
    }

    #[cfg(not(feature = "backend-tract"))]
    #[test]
    fn tract_backend_needs_feature() {
        let settings = ModelSettings {
            backend: BackendKind::Tract,
            ..ModelSettings::default()
        };
        assert!(open_backend(&settings).is_err());
    }
}
