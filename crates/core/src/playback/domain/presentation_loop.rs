use std::time::Instant;

use crate::playback::domain::playback_logger::PlaybackLogger;
use crate::playback::domain::playback_session::PlaybackSession;
use crate::shared::error::Result;
use crate::surface::domain::renderer::Renderer;

/// Counters reported when the loop ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub ticks: u64,
    pub pictures_published: u64,
    pub loops: u64,
}

/// Drives a session at the renderer's tick rate until the renderer asks to
/// stop or a tick fails. The session is always closed on the way out.
pub struct PresentationLoop {
    logger: Box<dyn PlaybackLogger>,
}

impl PresentationLoop {
    pub fn new(logger: Box<dyn PlaybackLogger>) -> Self {
        Self { logger }
    }

    pub fn run(
        &mut self,
        mut session: PlaybackSession,
        renderer: &mut dyn Renderer,
    ) -> Result<PlaybackSummary> {
        self.logger.info(&format!(
            "presenting at {} ticks per second",
            renderer.tick_rate()
        ));

        let started = Instant::now();
        let mut ticks = 0u64;
        let result = loop {
            if !renderer.should_continue() {
                break Ok(());
            }
            let report = match session.tick(renderer) {
                Ok(report) => report,
                Err(e) => break Err(e),
            };
            ticks += 1;

            self.logger.timing("decode", report.decode_ms);
            self.logger.timing("render", report.render_ms);
            self.logger
                .metric("accumulator", session.pacer().accumulator());
            if report.advanced {
                let state = session.state();
                self.logger.progress(state.pictures_published, state.loops);
            }

            renderer.wait_for_tick();
        };

        session.close(renderer);
        let state = session.state();
        let summary = PlaybackSummary {
            ticks,
            pictures_published: state.pictures_published,
            loops: state.loops,
        };
        self.logger.info(&format!(
            "stopped after {ticks} ticks in {:.1}s",
            started.elapsed().as_secs_f64()
        ));
        self.logger.summary();

        result.map(|()| summary)
    }
}
