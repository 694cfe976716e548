//! Push-up Counter
//!
//! Counts push-up repetitions from single-person pose estimates, one frame
//! at a time.
//!
//! # Architecture
//!
//! Frames flow one way through the pipeline:
//!
//! 1. **Ingest**: a source yields an owned RGB `Frame`.
//! 2. **Model**: an explicitly owned `ModelHandle` runs a `PoseBackend` and
//!    returns the raw flat output buffer.
//! 3. **Pose**: the buffer is decoded into 17 keypoints in canonical order.
//! 4. **Counter**: shoulder and hip heights drive a two-state machine with a
//!    hysteresis band, so jitter around the threshold never double counts.
//! 5. **Overlay**: keypoints and skeleton segments are scaled to display
//!    coordinates for whatever renderer sits on top.
//!
//! # Module Structure
//!
//! - `pose`: body parts, keypoints, extraction and the skeleton tables
//! - `counter`: the repetition state machine and its shared session cell
//! - `model`: backend trait, handle lifecycle, synthetic and ONNX backends
//! - `overlay`: display-space overlay data
//! - `ingest`: frame sources
//! - `pipeline`: the per-frame glue
//! - `config`: layered file + env configuration

pub mod config;
pub mod counter;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod pose;
pub mod ui;

pub use config::{AppConfig, BackendKind, ModelSettings, SourceSettings};
pub use counter::{
    CounterConfig, Phase, RepCounter, RepState, SharedCounter, SideStrategy, Threshold, Tick,
    Transition,
};
pub use error::{PoseError, PoseResult, ShapeExpectation};
pub use frame::Frame;
pub use ingest::{FrameSource, SourceStats};
pub use model::{
    open_backend, InputShape, ModelHandle, ModelOutput, ModelState, OutputSpace, PoseBackend,
    SyntheticBackend, SyntheticMotion,
};
pub use overlay::{OverlayFrame, OverlaySettings};
pub use pipeline::{FramePipeline, FrameReport, InferenceStats};
pub use pose::skeleton::{EdgeSet, LIMB_EDGES, SKELETON_EDGES};
pub use pose::{extract_keypoints, BodyPart, Keypoint, Pose, TupleLayout, KEYPOINT_COUNT};
