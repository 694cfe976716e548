//! Per-frame processing: model output → pose → rep counter → overlay.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use crate::config::AppConfig;
use crate::counter::{CounterConfig, RepCounter, RepState, Tick, Transition};
use crate::frame::Frame;
use crate::model::{open_backend, ModelHandle, ModelOutput, OutputSpace};
use crate::overlay::{OverlayFrame, OverlaySettings};
use crate::pose::Pose;

/// Everything produced for one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub sequence: u64,
    pub tick: Tick,
    pub state: RepState,
    pub overlay: OverlayFrame,
    /// Wall time of the model call for this frame.
    pub inference_ms: f64,
}

impl FrameReport {
    pub fn inference_fps(&self) -> Option<u32> {
        fps_from_latency(self.inference_ms)
    }
}

/// Running inference latency over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InferenceStats {
    pub frames: u64,
    pub total: Duration,
}

impl InferenceStats {
    pub fn record(&mut self, latency: Duration) {
        self.frames += 1;
        self.total += latency;
    }

    pub fn mean_ms(&self) -> Option<f64> {
        (self.frames > 0).then(|| self.total.as_secs_f64() * 1000.0 / self.frames as f64)
    }

    /// Whole frames per second at the mean latency.
    pub fn fps(&self) -> Option<u32> {
        self.mean_ms().and_then(fps_from_latency)
    }
}

/// `floor(1000 / latency_ms)`; `None` for a zero or non-finite latency.
pub fn fps_from_latency(latency_ms: f64) -> Option<u32> {
    if latency_ms.is_finite() && latency_ms > 0.0 {
        Some((1000.0 / latency_ms).floor() as u32)
    } else {
        None
    }
}

pub struct FramePipeline {
    handle: ModelHandle,
    counter: RepCounter,
    overlay: OverlaySettings,
    latency: InferenceStats,
}

impl FramePipeline {
    pub fn new(handle: ModelHandle, counter: CounterConfig, overlay: OverlaySettings) -> Self {
        Self {
            handle,
            counter: RepCounter::new(counter),
            overlay,
            latency: InferenceStats::default(),
        }
    }

    /// Open and load the configured backend.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let backend = open_backend(&cfg.model)?;
        let handle = ModelHandle::loaded(backend)?;
        Ok(Self::new(handle, cfg.counter, cfg.overlay.clone()))
    }

    pub fn process(&mut self, frame: &Frame) -> Result<FrameReport> {
        let started = Instant::now();
        let output = self.handle.infer(frame)?;
        let latency = started.elapsed();
        self.latency.record(latency);

        let pose = Pose::from_output(&output.values, output.layout)?;
        let pose = to_frame_space(&pose, &output, (frame.width, frame.height));

        let tick = self.counter.update(&pose, frame.height as f32);
        match tick {
            Tick::Observed {
                transition: Transition::RepCompleted { count },
                ..
            } => log::info!("rep {count} completed at frame {}", frame.sequence),
            Tick::Observed {
                transition: Transition::WentDown,
                ..
            } => log::debug!("down position at frame {}", frame.sequence),
            Tick::Skipped { missing } => {
                log::debug!("frame {} skipped: {missing} not visible", frame.sequence)
            }
            Tick::Observed { .. } => {}
        }

        let overlay = OverlayFrame::build(&pose, (frame.width, frame.height), &self.overlay);
        log::trace!("frame {} done {}ms after capture", frame.sequence, frame.age_ms());
        Ok(FrameReport {
            sequence: frame.sequence,
            tick,
            state: self.counter.state(),
            overlay,
            inference_ms: latency.as_secs_f64() * 1000.0,
        })
    }

    pub fn state(&self) -> RepState {
        self.counter.state()
    }

    pub fn inference_stats(&self) -> InferenceStats {
        self.latency
    }

    pub fn reset(&mut self) {
        self.counter.reset();
        self.latency = InferenceStats::default();
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Release the model. Further `process` calls fail.
    pub fn release(&mut self) {
        self.handle.release();
    }
}

/// Map model keypoints into pixel coordinates of a `frame_size` frame.
pub fn to_frame_space(pose: &Pose, output: &ModelOutput, frame_size: (u32, u32)) -> Pose {
    let (fw, fh) = (frame_size.0 as f32, frame_size.1 as f32);
    match output.space {
        OutputSpace::Normalized => pose.scaled(fw, fh),
        OutputSpace::InputPixels => {
            let ratio = |frame: f32, input: u32| {
                if input == 0 {
                    0.0
                } else {
                    frame / input as f32
                }
            };
            pose.scaled(ratio(fw, output.input.width), ratio(fh, output.input.height))
        }
    }
}
