use std::path::{Path, PathBuf};

use crate::shared::error::{PlaybackError, Result};
use crate::surface::domain::snapshot_sink::SnapshotSink;
use crate::surface::domain::surface_publisher::DisplaySurface;

/// Saves every `every`-th published picture as a PNG using the `image` crate.
pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
    written: Vec<PathBuf>,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Self {
        Self {
            dir: dir.into(),
            every: every.max(1),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl SnapshotSink for SnapshotWriter {
    /// Writes `surface` when `picture_index` falls on the snapshot interval.
    fn capture(&mut self, picture_index: u64, surface: &DisplaySurface) -> Result<Option<PathBuf>> {
        if picture_index == 0 || picture_index % self.every != 0 {
            return Ok(None);
        }
        let path = self.dir.join(format!("picture_{picture_index:06}.png"));
        write_png(&path, surface.pixels(), surface.width(), surface.height())?;
        log::debug!("snapshot written to {}", path.display());
        self.written.push(path.clone());
        Ok(Some(path))
    }
}

/// Encodes packed RGB24 pixels to `path`, creating parent directories.
pub fn write_png(path: &Path, pixels: &[u8], width: u32, height: u32) -> Result<()> {
    let snapshot_err = |message: String| PlaybackError::Snapshot {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| snapshot_err(e.to_string()))?;
    }

    let img = image::RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| snapshot_err("pixel buffer does not match dimensions".into()))?;
    img.save(path).map_err(|e| snapshot_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::picture::PictureView;
    use crate::shared::stream_metadata::StreamMetadata;
    use crate::surface::domain::surface_publisher::SurfacePublisher;
    use crate::surface::infrastructure::null_renderer::NullRenderer;

    fn surface_with(pixels: &[u8], width: u32, height: u32) -> SurfacePublisher {
        let meta = StreamMetadata {
            width,
            height,
            frame_period: 1_080_000,
        };
        let mut renderer = NullRenderer::new();
        let mut publisher = SurfacePublisher::new();
        publisher.allocate(&meta, &mut renderer).unwrap();
        publisher
            .publish(PictureView::new(pixels, width, height))
            .unwrap();
        publisher
    }

    #[test]
    fn test_write_png_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        let pixels = [50u8, 100, 200].repeat(6);
        write_png(&path, &pixels, 3, 2).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [50, 100, 200]);
    }

    #[test]
    fn test_write_png_rejects_short_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_png(&dir.path().join("out.png"), &[0u8; 5], 2, 2);
        assert!(matches!(result, Err(PlaybackError::Snapshot { .. })));
    }

    #[test]
    fn test_write_png_unwritable_parent_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        let result = write_png(&file.join("out.png"), &[0u8; 3], 1, 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_capture_follows_interval() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = surface_with(&[9u8; 12], 2, 2);
        let surface = publisher.surface().unwrap();
        let mut writer = SnapshotWriter::new(dir.path(), 3);

        let written: Vec<u64> = (0..=7)
            .filter(|&i| writer.capture(i, surface).unwrap().is_some())
            .collect();
        assert_eq!(written, vec![3, 6]);
        assert_eq!(writer.written().len(), 2);
        assert!(dir.path().join("picture_000003.png").exists());
    }

    #[test]
    fn test_zero_interval_writes_every_picture() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = surface_with(&[1u8; 3], 1, 1);
        let mut writer = SnapshotWriter::new(dir.path(), 0);
        assert!(writer
            .capture(1, publisher.surface().unwrap())
            .unwrap()
            .is_some());
    }
}
