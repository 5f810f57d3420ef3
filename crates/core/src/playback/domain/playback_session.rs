use std::path::Path;
use std::time::Instant;

use crate::decode::domain::decoder_adapter::DecoderAdapter;
use crate::decode::domain::incremental_decoder::IncrementalDecoder;
use crate::decode::domain::picture_sink::PictureSink;
use crate::pacing::domain::frame_pacer::{FramePacer, PacingConfig};
use crate::playback::domain::playback_state::PlaybackState;
use crate::shared::config::PlayerConfig;
use crate::shared::error::{PlaybackError, Result};
use crate::shared::picture::PictureView;
use crate::shared::stream_metadata::StreamMetadata;
use crate::stream::domain::bitstream_reader::BitstreamReader;
use crate::stream::domain::chunk_source::ChunkSource;
use crate::surface::domain::renderer::Renderer;
use crate::surface::domain::snapshot_sink::SnapshotSink;
use crate::surface::domain::surface_publisher::SurfacePublisher;

/// What one presentation tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// The pacer let the picture advance and a new one was published.
    pub advanced: bool,
    /// The surface texture was re-uploaded before drawing.
    pub uploaded: bool,
    pub frame_number: u64,
    pub decode_ms: f64,
    pub render_ms: f64,
}

/// One playback of one stream: reader and decoder (through the adapter),
/// pacer, display surface and the session-state record.
///
/// Built by [`PlaybackSession::open`]; torn down by
/// [`PlaybackSession::close`] in reverse creation order.
pub struct PlaybackSession {
    adapter: Option<DecoderAdapter>,
    pacer: FramePacer,
    publisher: SurfacePublisher,
    state: PlaybackState,
    snapshots: Option<Box<dyn SnapshotSink>>,
}

impl PlaybackSession {
    /// Opens the stream, then creates the decoder. Either failure aborts
    /// before anything is decoded or drawn.
    pub fn open<S, D>(config: &PlayerConfig, open_source: S, create_decoder: D) -> Result<Self>
    where
        S: FnOnce(&Path) -> Result<Box<dyn ChunkSource>>,
        D: FnOnce() -> Result<Box<dyn IncrementalDecoder>>,
    {
        config.validate()?;
        let source = open_source(&config.input)?;
        let decoder = create_decoder()?;
        log::info!(
            "opened {} ({} byte chunks)",
            config.input.display(),
            config.chunk_size
        );

        let reader = BitstreamReader::with_chunk_size(source, config.chunk_size);
        let adapter =
            DecoderAdapter::new(decoder, reader).with_max_empty_loops(config.max_empty_loops);

        Ok(Self {
            adapter: Some(adapter),
            pacer: FramePacer::new(PacingConfig::from(config)),
            publisher: SurfacePublisher::new(),
            state: PlaybackState::new(),
            snapshots: None,
        })
    }

    pub fn with_snapshots(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.snapshots = Some(sink);
        self
    }

    /// Runs one presentation tick: pacer gate, at most one picture advance,
    /// texture upload if the surface changed, then a draw.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> Result<TickReport> {
        let adapter = self
            .adapter
            .as_mut()
            .ok_or_else(|| PlaybackError::Decode("session is closed".into()))?;

        let started = Instant::now();
        let advanced = self.pacer.tick();
        if advanced {
            let mut sink = SessionSink {
                publisher: &mut self.publisher,
                pacer: &mut self.pacer,
                renderer: &mut *renderer,
            };
            adapter.advance_picture(&mut self.state, &mut sink)?;

            if let (Some(sink), Some(surface)) =
                (self.snapshots.as_mut(), self.publisher.surface())
            {
                sink.capture(self.state.pictures_published, surface)?;
            }
        }
        let decode_ms = started.elapsed().as_secs_f64() * 1000.0;

        let started = Instant::now();
        let uploaded = self.publisher.flush(renderer)?;
        renderer.draw(self.publisher.texture())?;
        let render_ms = started.elapsed().as_secs_f64() * 1000.0;

        Ok(TickReport {
            advanced,
            uploaded,
            frame_number: self.state.frame_number,
            decode_ms,
            render_ms,
        })
    }

    /// Releases the surface texture, then the decoder, then the stream.
    pub fn close(&mut self, renderer: &mut dyn Renderer) {
        self.publisher.release(renderer);
        if self.adapter.take().is_some() {
            log::info!(
                "closed after {} pictures ({} loops)",
                self.state.pictures_published,
                self.state.loops
            );
        }
    }

    pub fn is_open(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn publisher(&self) -> &SurfacePublisher {
        &self.publisher
    }

    pub fn has_snapshots(&self) -> bool {
        self.snapshots.is_some()
    }
}

/// Routes adapter output into the session: metadata allocates the surface
/// and calibrates the pacer, pictures land in the surface.
struct SessionSink<'a> {
    publisher: &'a mut SurfacePublisher,
    pacer: &'a mut FramePacer,
    renderer: &'a mut dyn Renderer,
}

impl PictureSink for SessionSink<'_> {
    fn on_metadata(&mut self, metadata: &StreamMetadata) -> Result<()> {
        self.publisher.allocate(metadata, &mut *self.renderer)?;
        self.pacer.calibrate(metadata.frame_period);
        Ok(())
    }

    fn publish(&mut self, picture: PictureView<'_>) -> Result<()> {
        self.publisher.publish(picture)
    }
}
