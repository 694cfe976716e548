//! Frame ingestion sources.
//!
//! Sources produce owned RGB `Frame`s, one at a time, for the pipeline:
//! - `stub://<name>`: synthetic frames (testing, demos)
//! - a local directory of PNG/JPEG stills (feature: ingest-image)
//!
//! Sources never retain a frame after handing it out and never fetch
//! remote URLs.

#[cfg(feature = "ingest-image")]
mod image_dir;
mod synthetic;

use anyhow::{anyhow, Result};

use crate::config::SourceSettings;
use crate::frame::Frame;
#[cfg(feature = "ingest-image")]
use image_dir::ImageDirSource;
use synthetic::SyntheticSource;

const STUB_SCHEME: &str = "stub://";

/// Local frame source.
pub struct FrameSource {
    backend: SourceBackend,
    dropped: u64,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-image")]
    ImageDir(ImageDirSource),
}

impl FrameSource {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        if !is_local_source(&settings.uri) {
            return Err(anyhow!(
                "frame ingestion only supports stub:// or local paths, got {}",
                settings.uri
            ));
        }
        if settings.uri.starts_with(STUB_SCHEME) {
            Ok(Self {
                backend: SourceBackend::Synthetic(SyntheticSource::new(settings)),
                dropped: 0,
            })
        } else {
            #[cfg(feature = "ingest-image")]
            {
                Ok(Self {
                    backend: SourceBackend::ImageDir(ImageDirSource::new(settings)?),
                    dropped: 0,
                })
            }
            #[cfg(not(feature = "ingest-image"))]
            {
                Err(anyhow!(
                    "image directory ingestion requires the ingest-image feature"
                ))
            }
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.connect(),
        }
    }

    /// Capture the next frame. `None` once a finite source is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame().map(Some),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.next_frame(),
        }
    }

    /// Next frame that decodes. Failed frames are logged and skipped until
    /// the source reports itself unhealthy, which ends the stream with an error.
    pub fn next_usable_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.next_frame() {
                Ok(frame) => return Ok(frame),
                Err(err) => {
                    self.dropped += 1;
                    if !self.is_healthy() {
                        return Err(err.context("frame source unhealthy after repeated failures"));
                    }
                    log::warn!("FrameSource: dropped frame: {err:#}");
                }
            }
        }
    }

    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            SourceBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.is_healthy(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        let mut stats = match &self.backend {
            SourceBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.stats(),
        };
        stats.frames_dropped = self.dropped;
        stats
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    /// Frames skipped by `next_usable_frame` because they failed to decode.
    pub frames_dropped: u64,
    pub uri: String,
}

fn is_local_source(uri: &str) -> bool {
    if uri.trim().is_empty() {
        return false;
    }
    if uri.starts_with(STUB_SCHEME) {
        return true;
    }
    !uri.contains("://")
}
