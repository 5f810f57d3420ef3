use crate::decode::domain::decoder_state::DecoderState;
use crate::decode::domain::incremental_decoder::IncrementalDecoder;
use crate::decode::domain::picture_sink::PictureSink;
use crate::playback::domain::playback_state::PlaybackState;
use crate::shared::constants::DEFAULT_MAX_EMPTY_LOOPS;
use crate::shared::error::{PlaybackError, Result};
use crate::shared::picture::PixelLayout;
use crate::stream::domain::bitstream_reader::BitstreamReader;

/// Drives an [`IncrementalDecoder`] until exactly one picture is published.
///
/// Owns the decoder and the reader feeding it. The adapter keeps no
/// playback state of its own: frame counting and the latched metadata live
/// in the [`PlaybackState`] passed to every call.
pub struct DecoderAdapter {
    decoder: Box<dyn IncrementalDecoder>,
    reader: BitstreamReader,
    max_empty_loops: u32,
}

impl DecoderAdapter {
    pub fn new(decoder: Box<dyn IncrementalDecoder>, reader: BitstreamReader) -> Self {
        Self {
            decoder,
            reader,
            max_empty_loops: DEFAULT_MAX_EMPTY_LOOPS,
        }
    }

    /// Loop boundaries tolerated within one advance before giving up.
    /// At least one is always allowed, since an ordinary rewind crosses one.
    pub fn with_max_empty_loops(mut self, max_empty_loops: u32) -> Self {
        self.max_empty_loops = max_empty_loops.max(1);
        self
    }

    pub fn reader(&self) -> &BitstreamReader {
        &self.reader
    }

    /// Runs the decoder's state machine until one more picture has been
    /// handed to `sink`.
    ///
    /// On the first displayable picture of the session the stream metadata
    /// is latched into `state` and reported through
    /// [`PictureSink::on_metadata`] before the picture is published.
    pub fn advance_picture(
        &mut self,
        state: &mut PlaybackState,
        sink: &mut dyn PictureSink,
    ) -> Result<()> {
        let mut empty_loops = 0u32;

        loop {
            match self.decoder.parse() {
                DecoderState::NeedData => {
                    let chunk = self
                        .reader
                        .next_default_chunk()
                        .map_err(PlaybackError::StreamRead)?;
                    if chunk.is_empty() {
                        state.restart_loop();
                        empty_loops += 1;
                        log::debug!("end of stream, restarting (loop {})", state.loops);
                        if empty_loops > self.max_empty_loops {
                            log::warn!("no picture after {empty_loops} passes over the stream");
                            return Err(PlaybackError::Stalled { loops: empty_loops });
                        }
                    }
                    self.decoder.feed(chunk);
                }
                DecoderState::SequenceReady => {
                    self.decoder.select_output(PixelLayout::Rgb24)?;
                }
                DecoderState::PictureReady => {
                    let Some(picture) = self.decoder.display_picture() else {
                        continue;
                    };
                    if state.metadata.is_none() {
                        let metadata = self
                            .decoder
                            .sequence()
                            .ok_or_else(|| {
                                PlaybackError::Decode("picture decoded before sequence".into())
                            })?;
                        log::info!(
                            "stream is {}x{}, frame period {}",
                            metadata.width,
                            metadata.height,
                            metadata.frame_period
                        );
                        state.metadata = Some(metadata);
                        sink.on_metadata(&metadata)?;
                    }
                    state.frame_number += 1;
                    state.pictures_published += 1;
                    sink.publish(picture)?;
                    return Ok(());
                }
                DecoderState::Other => {}
            }
        }
    }
}
