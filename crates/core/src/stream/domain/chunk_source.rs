use std::io;

/// Sequential supplier of coded bytes from a rewindable source.
pub trait ChunkSource {
    /// Reads up to `buf.len()` bytes from the current position.
    /// `Ok(0)` means the end of the source has been reached.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Repositions to the first byte of the source.
    fn rewind(&mut self) -> io::Result<()>;
}
