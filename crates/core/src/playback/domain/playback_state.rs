use crate::shared::stream_metadata::StreamMetadata;

/// Mutable per-session playback record, threaded through the pacer gate and
/// the decoder adapter by the session that owns it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackState {
    /// Pictures decoded since the stream last (re)started.
    pub frame_number: u64,
    /// Pictures published over the whole session.
    pub pictures_published: u64,
    /// Loop boundaries crossed.
    pub loops: u64,
    /// Latched on the first displayable picture; never changes afterwards.
    pub metadata: Option<StreamMetadata>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stream's dimensions and timing are known.
    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Records a loop boundary: the per-loop frame counter restarts.
    pub fn restart_loop(&mut self) {
        self.frame_number = 0;
        self.loops += 1;
    }
}
