use crate::shared::error::Result;
use crate::shared::picture::PictureView;
use crate::shared::stream_metadata::StreamMetadata;

/// Receives what the decoder adapter produces during an advance.
pub trait PictureSink {
    /// Called once per session, before the first `publish`, when the
    /// stream's metadata is latched.
    fn on_metadata(&mut self, metadata: &StreamMetadata) -> Result<()>;

    /// Receives a completed picture. The view must be copied before
    /// returning.
    fn publish(&mut self, picture: PictureView<'_>) -> Result<()>;
}
