//! Scripted decoder and recording sink shared by the adapter and session
//! tests.
//!
//! The toy bitstream is a sequence of tokens:
//! `SQ` + width (u16 BE) + height (u16 BE) + frame period (u32 BE),
//! `PC` + `width * height * 3` RGB bytes, and `NP` for a completed picture
//! with no display buffer. Unknown bytes are skipped one at a time.

use std::cell::Cell;
use std::rc::Rc;

use crate::decode::domain::decoder_state::DecoderState;
use crate::decode::domain::incremental_decoder::IncrementalDecoder;
use crate::decode::domain::picture_sink::PictureSink;
use crate::shared::error::Result;
use crate::shared::picture::{PictureView, PixelLayout};
use crate::shared::stream_metadata::StreamMetadata;

const SEQUENCE_LEN: usize = 10;

pub(crate) fn toy_sequence(meta: StreamMetadata) -> Vec<u8> {
    let mut out = b"SQ".to_vec();
    out.extend_from_slice(&(meta.width as u16).to_be_bytes());
    out.extend_from_slice(&(meta.height as u16).to_be_bytes());
    out.extend_from_slice(&meta.frame_period.to_be_bytes());
    out
}

pub(crate) fn toy_picture(pixels: &[u8]) -> Vec<u8> {
    let mut out = b"PC".to_vec();
    out.extend_from_slice(pixels);
    out
}

/// A stream with one sequence header followed by `pictures`.
pub(crate) fn toy_stream(meta: StreamMetadata, pictures: &[Vec<u8>]) -> Vec<u8> {
    let mut out = toy_sequence(meta);
    for p in pictures {
        out.extend(toy_picture(p));
    }
    out
}

/// Solid-colour picture whose every byte is `value`.
pub(crate) fn solid(meta: StreamMetadata, value: u8) -> Vec<u8> {
    vec![value; meta.rgb_len()]
}

#[derive(Default)]
pub(crate) struct ToyDecoder {
    buf: Vec<u8>,
    sequence: Option<StreamMetadata>,
    layout: Option<PixelLayout>,
    display: Option<Vec<u8>>,
    /// Shared so tests can keep a handle after boxing the decoder.
    pub end_of_data_feeds: Rc<Cell<usize>>,
    pub selections: Rc<Cell<usize>>,
}

impl ToyDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IncrementalDecoder for ToyDecoder {
    fn parse(&mut self) -> DecoderState {
        if self.buf.starts_with(b"SQ") {
            if self.buf.len() < SEQUENCE_LEN {
                return DecoderState::NeedData;
            }
            let meta = StreamMetadata {
                width: u16::from_be_bytes([self.buf[2], self.buf[3]]) as u32,
                height: u16::from_be_bytes([self.buf[4], self.buf[5]]) as u32,
                frame_period: u32::from_be_bytes([
                    self.buf[6],
                    self.buf[7],
                    self.buf[8],
                    self.buf[9],
                ]),
            };
            self.buf.drain(..SEQUENCE_LEN);
            if self.sequence != Some(meta) {
                self.sequence = Some(meta);
                self.layout = None;
                return DecoderState::SequenceReady;
            }
            return DecoderState::Other;
        }

        if self.buf.starts_with(b"NP") {
            self.buf.drain(..2);
            self.display = None;
            return DecoderState::PictureReady;
        }

        if self.buf.starts_with(b"PC") {
            let Some(meta) = self.sequence else {
                self.buf.drain(..2);
                return DecoderState::Other;
            };
            let end = 2 + meta.rgb_len();
            if self.buf.len() < end {
                return DecoderState::NeedData;
            }
            let pixels: Vec<u8> = self.buf.drain(..end).skip(2).collect();
            if self.layout.is_none() {
                return DecoderState::Other;
            }
            self.display = Some(pixels);
            return DecoderState::PictureReady;
        }

        if self.buf.len() >= 2 {
            self.buf.remove(0);
            return DecoderState::Other;
        }
        DecoderState::NeedData
    }

    fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            self.end_of_data_feeds.set(self.end_of_data_feeds.get() + 1);
            // A dangling partial token cannot be completed by the restarted stream.
            self.buf.clear();
        }
        self.buf.extend_from_slice(data);
    }

    fn sequence(&self) -> Option<StreamMetadata> {
        self.sequence
    }

    fn display_picture(&self) -> Option<PictureView<'_>> {
        let meta = self.sequence?;
        self.display
            .as_ref()
            .map(|d| PictureView::new(d, meta.width, meta.height))
    }

    fn select_output(&mut self, layout: PixelLayout) -> Result<()> {
        self.selections.set(self.selections.get() + 1);
        self.layout = Some(layout);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub metadata: Vec<StreamMetadata>,
    pub published: Vec<Vec<u8>>,
}

impl PictureSink for RecordingSink {
    fn on_metadata(&mut self, metadata: &StreamMetadata) -> Result<()> {
        self.metadata.push(*metadata);
        Ok(())
    }

    fn publish(&mut self, picture: PictureView<'_>) -> Result<()> {
        self.published.push(picture.data().to_vec());
        Ok(())
    }
}
