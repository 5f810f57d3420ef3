use crate::shared::constants::RGB_CHANNELS;

/// Sequence-level facts about the stream, discovered once from its header.
///
/// `frame_period` is expressed in the decoder's native unit: ticks of the
/// 27 MHz MPEG system clock per displayed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_period: u32,
}

impl StreamMetadata {
    /// Size in bytes of one packed RGB picture.
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * RGB_CHANNELS
    }
}
