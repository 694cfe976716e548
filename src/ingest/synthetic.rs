use anyhow::Result;

use super::SourceStats;
use crate::config::SourceSettings;
use crate::frame::Frame;

/// Endless `stub://` source. Pixel content is a flat shade that drifts per frame.
pub(super) struct SyntheticSource {
    settings: SourceSettings,
    frame_count: u64,
}

impl SyntheticSource {
    pub(super) fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
        }
    }

    pub(super) fn connect(&mut self) -> Result<()> {
        log::info!(
            "FrameSource: connected to {} (synthetic, {}x{} @ {} fps)",
            self.settings.uri,
            self.settings.width,
            self.settings.height,
            self.settings.target_fps
        );
        Ok(())
    }

    pub(super) fn next_frame(&mut self) -> Result<Frame> {
        let sequence = self.frame_count;
        self.frame_count += 1;
        let shade = (sequence % 256) as u8;
        Frame::filled(self.settings.width, self.settings.height, sequence, shade)
    }

    pub(super) fn is_healthy(&self) -> bool {
        true
    }

    pub(super) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            frames_dropped: 0,
            uri: self.settings.uri.clone(),
        }
    }
}
