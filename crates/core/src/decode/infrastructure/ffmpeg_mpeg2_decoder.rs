use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::decode::domain::decoder_state::DecoderState;
use crate::decode::domain::incremental_decoder::IncrementalDecoder;
use crate::decode::infrastructure::mpeg2_splitter::{Mpeg2Splitter, SequenceHeader};
use crate::shared::constants::RGB_CHANNELS;
use crate::shared::error::{PlaybackError, Result};
use crate::shared::picture::{PictureView, PixelLayout};
use crate::shared::stream_metadata::StreamMetadata;

/// Incremental MPEG-2 video decoder built on libavcodec (via ffmpeg-next).
///
/// Raw elementary-stream bytes are cut into access units by
/// [`Mpeg2Splitter`]; each `parse` step does at most one unit of work
/// (receive a frame, announce a sequence, or submit one access unit) so the
/// caller sees the same pull-style progression as a classic
/// buffer/sequence/slice state machine.
pub struct FfmpegMpeg2Decoder {
    decoder: ffmpeg_next::decoder::Video,
    splitter: Mpeg2Splitter,
    sequence: Option<SequenceHeader>,
    layout: Option<PixelLayout>,
    scaler: Option<(scaling::Context, (Pixel, u32, u32))>,
    decoded: Video,
    converted: Video,
    display: Vec<u8>,
    display_size: Option<(u32, u32)>,
}

impl FfmpegMpeg2Decoder {
    pub fn new() -> Result<Self> {
        ffmpeg_next::init().map_err(|e| PlaybackError::DecoderInit(e.to_string()))?;

        let codec = ffmpeg_next::decoder::find(ffmpeg_next::codec::Id::MPEG2VIDEO).ok_or_else(
            || PlaybackError::DecoderInit("no MPEG-2 video decoder in this ffmpeg build".into()),
        )?;
        let decoder = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .decoder()
            .video()
            .map_err(|e| PlaybackError::DecoderInit(e.to_string()))?;

        Ok(Self {
            decoder,
            splitter: Mpeg2Splitter::new(),
            sequence: None,
            layout: None,
            scaler: None,
            decoded: Video::empty(),
            converted: Video::empty(),
            display: Vec::new(),
            display_size: None,
        })
    }

    /// Pulls one decoded frame, converting it into the display buffer.
    /// Returns `false` when libavcodec has nothing to hand out or the frame
    /// had to be dropped.
    fn receive_picture(&mut self) -> bool {
        if self.decoder.receive_frame(&mut self.decoded).is_err() {
            return false;
        }
        if self.layout != Some(PixelLayout::Rgb24) {
            return false;
        }
        match self.convert() {
            Ok(()) => true,
            Err(e) => {
                log::debug!("dropping picture that failed RGB conversion: {e}");
                false
            }
        }
    }

    fn convert(&mut self) -> std::result::Result<(), ffmpeg_next::Error> {
        let key = (
            self.decoded.format(),
            self.decoded.width(),
            self.decoded.height(),
        );
        let (_, width, height) = key;

        if self.scaler.as_ref().map(|(_, k)| *k) != Some(key) {
            let context = scaling::Context::get(
                key.0,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?;
            self.scaler = Some((context, key));
        }
        if let Some((scaler, _)) = self.scaler.as_mut() {
            scaler.run(&self.decoded, &mut self.converted)?;
        }

        copy_packed_rgb(&self.converted, width, height, &mut self.display);
        self.display_size = Some((width, height));
        Ok(())
    }

    fn submit(&mut self, unit: &[u8]) {
        let packet = ffmpeg_next::Packet::copy(unit);
        if let Err(e) = self.decoder.send_packet(&packet) {
            log::debug!("decoder rejected access unit of {} bytes: {e}", unit.len());
        }
    }
}

impl IncrementalDecoder for FfmpegMpeg2Decoder {
    fn parse(&mut self) -> DecoderState {
        if self.receive_picture() {
            return DecoderState::PictureReady;
        }
        if let Some(header) = self.splitter.take_new_sequence() {
            log::info!(
                "sequence {}x{}, frame_rate_code {}",
                header.width,
                header.height,
                header.frame_rate_code
            );
            self.sequence = Some(header);
            self.layout = None;
            return DecoderState::SequenceReady;
        }
        if let Some(unit) = self.splitter.next_unit() {
            self.submit(&unit);
            return DecoderState::Other;
        }
        DecoderState::NeedData
    }

    fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            self.splitter.finish();
        } else {
            self.splitter.push(data);
        }
    }

    fn sequence(&self) -> Option<StreamMetadata> {
        self.sequence.map(|s| s.metadata())
    }

    fn display_picture(&self) -> Option<PictureView<'_>> {
        self.display_size
            .map(|(w, h)| PictureView::new(&self.display, w, h))
    }

    fn select_output(&mut self, layout: PixelLayout) -> Result<()> {
        self.layout = Some(layout);
        Ok(())
    }
}

/// Copies plane 0 of a packed RGB24 frame into `dst`, dropping the row
/// padding ffmpeg adds when the stride exceeds `width * 3`.
fn copy_packed_rgb(frame: &Video, width: u32, height: u32, dst: &mut Vec<u8>) {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_len = width as usize * RGB_CHANNELS;

    dst.clear();
    dst.reserve(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        dst.extend_from_slice(&data[start..start + row_len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::domain::playback_session::PlaybackSession;
    use crate::shared::config::PlayerConfig;
    use crate::stream::infrastructure::reader_chunk_source::ReaderChunkSource;
    use crate::surface::infrastructure::null_renderer::NullRenderer;

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 48;

    /// Encodes `values.len()` flat grey pictures as a raw MPEG-2 video
    /// elementary stream at 25 fps.
    fn encode_stream(values: &[u8]) -> Vec<u8> {
        ffmpeg_next::init().unwrap();
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG2VIDEO).unwrap();
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(WIDTH);
        encoder_ctx.set_height(HEIGHT);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, 25));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(25, 1)));
        encoder_ctx.set_gop(1);
        encoder_ctx.set_max_b_frames(0);
        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();

        let mut out = Vec::new();
        for (i, &value) in values.iter().enumerate() {
            let mut frame = Video::new(Pixel::YUV420P, WIDTH, HEIGHT);
            for plane in 0..3 {
                let fill = if plane == 0 { value } else { 128 };
                frame.data_mut(plane).fill(fill);
            }
            frame.set_pts(Some(i as i64));
            encoder.send_frame(&frame).unwrap();
            drain(&mut encoder, &mut out);
        }
        encoder.send_eof().unwrap();
        drain(&mut encoder, &mut out);
        out
    }

    fn drain(encoder: &mut ffmpeg_next::codec::encoder::video::Encoder, out: &mut Vec<u8>) {
        let mut packet = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            if let Some(data) = packet.data() {
                out.extend_from_slice(data);
            }
        }
    }

    /// Drives the decoder over `stream` in `chunk`-sized pieces, looping
    /// with an end-of-data feed after every pass, and returns the first
    /// `count` pictures.
    fn decode_pictures(stream: &[u8], chunk: usize, count: usize) -> Vec<Vec<u8>> {
        let mut decoder = FfmpegMpeg2Decoder::new().unwrap();
        let mut pieces: Vec<&[u8]> = stream.chunks(chunk).collect();
        pieces.push(&[]);
        let mut chunks = pieces.into_iter().cycle();
        let mut pictures = Vec::new();
        let mut guard = 0;
        while pictures.len() < count {
            guard += 1;
            assert!(guard < 100_000, "decoder made no progress");
            match decoder.parse() {
                DecoderState::NeedData => decoder.feed(chunks.next().unwrap()),
                DecoderState::SequenceReady => decoder.select_output(PixelLayout::Rgb24).unwrap(),
                DecoderState::PictureReady => {
                    if let Some(p) = decoder.display_picture() {
                        pictures.push(p.data().to_vec());
                    }
                }
                DecoderState::Other => {}
            }
        }
        pictures
    }

    fn mean(pixels: &[u8]) -> f64 {
        pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64
    }

    #[test]
    fn test_new_creates_decoder() {
        assert!(FfmpegMpeg2Decoder::new().is_ok());
    }

    #[test]
    fn test_sequence_reports_dimensions_and_period() {
        let stream = encode_stream(&[60, 120, 180]);
        let mut decoder = FfmpegMpeg2Decoder::new().unwrap();
        assert_eq!(decoder.parse(), DecoderState::NeedData);
        decoder.feed(&stream);

        let mut state = decoder.parse();
        while state == DecoderState::Other {
            state = decoder.parse();
        }
        assert_eq!(state, DecoderState::SequenceReady);
        assert_eq!(
            decoder.sequence(),
            Some(StreamMetadata {
                width: WIDTH,
                height: HEIGHT,
                frame_period: 1_080_000,
            })
        );
    }

    #[test]
    fn test_pictures_are_packed_rgb() {
        let stream = encode_stream(&[60, 120, 180]);
        let pictures = decode_pictures(&stream, 4096, 2);
        for picture in &pictures {
            assert_eq!(picture.len(), (WIDTH * HEIGHT) as usize * 3);
        }
    }

    #[test]
    fn test_pictures_follow_stream_order() {
        let stream = encode_stream(&[30, 130, 230]);
        let pictures = decode_pictures(&stream, 512, 3);
        assert!(mean(&pictures[0]) < mean(&pictures[1]));
        assert!(mean(&pictures[1]) < mean(&pictures[2]));
    }

    #[test]
    fn test_decoding_continues_across_end_of_data() {
        let stream = encode_stream(&[40, 200]);
        let pictures = decode_pictures(&stream, 100_000, 4);
        assert!(mean(&pictures[0]) < mean(&pictures[1]));
        assert!((mean(&pictures[2]) - mean(&pictures[0])).abs() < 10.0);
    }

    #[test]
    fn test_garbage_input_produces_no_picture() {
        let mut decoder = FfmpegMpeg2Decoder::new().unwrap();
        decoder.feed(&[0x12; 4096]);
        decoder.feed(&[]);
        for _ in 0..16 {
            assert_ne!(decoder.parse(), DecoderState::PictureReady);
        }
        assert!(decoder.display_picture().is_none());
    }

    #[test]
    fn test_copy_packed_rgb_strips_padding() {
        let frame = Video::new(Pixel::RGB24, 3, 2);
        let mut dst = Vec::new();
        copy_packed_rgb(&frame, 3, 2, &mut dst);
        assert_eq!(dst.len(), 18);
    }

    #[test]
    fn test_session_presents_encoded_stream_and_replays_first_picture() {
        let stream = encode_stream(&[40, 200]);
        let config = PlayerConfig {
            chunk_size: 512,
            ..PlayerConfig::default()
        };
        let mut session = PlaybackSession::open(
            &config,
            move |_| Ok(Box::new(ReaderChunkSource::from_bytes(stream))),
            || Ok(Box::new(FfmpegMpeg2Decoder::new()?)),
        )
        .unwrap();
        let mut renderer = NullRenderer::new();

        let mut uploads = Vec::new();
        for _ in 0..60 {
            let report = session.tick(&mut renderer).unwrap();
            if report.uploaded {
                uploads.push(renderer.last_upload().unwrap().to_vec());
            }
            if uploads.len() == 3 {
                break;
            }
        }
        assert_eq!(uploads.len(), 3);

        let state = session.state();
        assert_eq!(
            state.metadata,
            Some(StreamMetadata {
                width: WIDTH,
                height: HEIGHT,
                frame_period: 1_080_000,
            })
        );
        assert!(state.loops >= 1);
        assert_eq!(renderer.created(), &[(WIDTH, HEIGHT)]);
        assert!(mean(&uploads[0]) < mean(&uploads[1]));
        assert!((mean(&uploads[2]) - mean(&uploads[0])).abs() < 10.0);

        session.close(&mut renderer);
        assert_eq!(renderer.live_textures(), 0);
    }
}
