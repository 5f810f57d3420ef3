use crate::decode::domain::decoder_state::DecoderState;
use crate::shared::error::Result;
use crate::shared::picture::{PictureView, PixelLayout};
use crate::shared::stream_metadata::StreamMetadata;

/// Pull-style decoder: the caller repeatedly calls [`parse`](Self::parse)
/// and reacts to the returned state, feeding bytes on `NeedData`.
///
/// Implementations handle the codec details; malformed input is absorbed
/// internally and never surfaces as an error from `parse`.
pub trait IncrementalDecoder {
    /// Advances the internal state machine by one step.
    fn parse(&mut self) -> DecoderState;

    /// Supplies the next bytes of the stream. An empty slice marks the end
    /// of the data currently available (the stream is about to restart).
    fn feed(&mut self, data: &[u8]);

    /// Metadata of the current sequence, once parsed.
    fn sequence(&self) -> Option<StreamMetadata>;

    /// The current display-ready picture, valid until the next `parse`.
    fn display_picture(&self) -> Option<PictureView<'_>>;

    /// Selects the pixel layout pictures are converted to.
    fn select_output(&mut self, layout: PixelLayout) -> Result<()>;
}
