use std::path::PathBuf;

use crate::shared::error::Result;
use crate::surface::domain::surface_publisher::DisplaySurface;

/// Receives the display surface after each publish and decides whether to
/// persist it.
pub trait SnapshotSink {
    /// `picture_index` is the 1-based count of published pictures.
    /// Returns the path written, if any.
    fn capture(&mut self, picture_index: u64, surface: &DisplaySurface) -> Result<Option<PathBuf>>;
}
