/// Externally observable states of an incremental decoder's parse step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    /// The decoder has consumed its input and needs the next chunk.
    NeedData,
    /// Sequence information (dimensions, timing) has just been parsed.
    /// The output pixel layout must be selected before pictures are produced.
    SequenceReady,
    /// A picture was completed (slice done, or the sequence ended,
    /// gracefully or not). A display picture may or may not be available.
    PictureReady,
    /// Any other internal step.
    Other,
}
