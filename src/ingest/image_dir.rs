use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::SourceStats;
use crate::config::SourceSettings;
use crate::frame::Frame;

/// Decode failures in a row before the source reports itself unhealthy.
const MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Finite source over the PNG/JPEG files of one directory, in name order.
pub(super) struct ImageDirSource {
    settings: SourceSettings,
    paths: Vec<PathBuf>,
    cursor: usize,
    frame_count: u64,
    consecutive_errors: u32,
}

impl ImageDirSource {
    pub(super) fn new(settings: SourceSettings) -> Result<Self> {
        Ok(Self {
            settings,
            paths: Vec::new(),
            cursor: 0,
            frame_count: 0,
            consecutive_errors: 0,
        })
    }

    pub(super) fn connect(&mut self) -> Result<()> {
        let dir = Path::new(&self.settings.uri);
        if !dir.is_dir() {
            return Err(anyhow!("not a directory: {}", dir.display()));
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_image_file(path))
            .collect();
        paths.sort();
        if paths.is_empty() {
            log::warn!("FrameSource: no images found in {}", dir.display());
        }
        log::info!(
            "FrameSource: connected to {} ({} images)",
            dir.display(),
            paths.len()
        );
        self.paths = paths;
        self.cursor = 0;
        Ok(())
    }

    pub(super) fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(err) => {
                self.consecutive_errors += 1;
                return Err(anyhow!("failed to decode {}: {err}", path.display()));
            }
        };
        self.consecutive_errors = 0;
        let (width, height) = image.dimensions();
        let frame = Frame::new(image.into_raw(), width, height, self.frame_count)?;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    pub(super) fn is_healthy(&self) -> bool {
        self.consecutive_errors < MAX_CONSECUTIVE_ERRORS
    }

    pub(super) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            frames_dropped: 0,
            uri: self.settings.uri.clone(),
        }
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "jpg" | "jpeg" | "png")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pngs_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10u8)] {
            let img = image::RgbImage::from_pixel(4, 2, image::Rgb([shade, shade, shade]));
            img.save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageDirSource::new(SourceSettings {
            uri: dir.path().to_string_lossy().into_owned(),
            ..SourceSettings::default()
        })
        .unwrap();
        source.connect().unwrap();

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!((first.width, first.height), (4, 2));
        assert_eq!(first.rgb_at(0, 0), [10, 10, 10]);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.rgb_at(3, 1), [20, 20, 20]);
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_captured, 2);
    }

    #[test]
    fn repeated_decode_failures_mark_source_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            std::fs::write(dir.path().join(name), b"not a png").unwrap();
        }
        image::RgbImage::from_pixel(2, 2, image::Rgb([5, 5, 5]))
            .save(dir.path().join("d.png"))
            .unwrap();

        let mut source = ImageDirSource::new(SourceSettings {
            uri: dir.path().to_string_lossy().into_owned(),
            ..SourceSettings::default()
        })
        .unwrap();
        source.connect().unwrap();

        assert!(source.next_frame().is_err());
        assert!(source.is_healthy());
        assert!(source.next_frame().is_err());
        assert!(source.next_frame().is_err());
        assert!(!source.is_healthy());

        // A good frame after bad ones restores health and keeps sequences dense.
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.sequence, 0);
        assert!(source.is_healthy());
        assert!(source.next_frame().unwrap().is_none());
    }
}
