use std::io;

use crate::shared::constants::CHUNK_SIZE;
use crate::stream::domain::chunk_source::ChunkSource;

/// Fixed-size chunk reader over a looping source.
///
/// An empty chunk marks the loop boundary: by the time it is returned the
/// source has already been rewound, so the next call yields the first bytes
/// of the stream again.
pub struct BitstreamReader {
    source: Box<dyn ChunkSource>,
    buffer: Vec<u8>,
    loops: u64,
    bytes_read: u64,
}

impl BitstreamReader {
    pub fn new(source: Box<dyn ChunkSource>) -> Self {
        Self::with_chunk_size(source, CHUNK_SIZE)
    }

    pub fn with_chunk_size(source: Box<dyn ChunkSource>, chunk_size: usize) -> Self {
        Self {
            source,
            buffer: vec![0u8; chunk_size.max(1)],
            loops: 0,
            bytes_read: 0,
        }
    }

    /// Reads up to `capacity` bytes (never more than the chunk size).
    pub fn next_chunk(&mut self, capacity: usize) -> io::Result<&[u8]> {
        let capacity = capacity.min(self.buffer.len());
        let n = loop {
            match self.source.read_chunk(&mut self.buffer[..capacity]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if n == 0 {
            self.source.rewind()?;
            self.loops += 1;
        }
        self.bytes_read += n as u64;
        Ok(&self.buffer[..n])
    }

    /// Reads a full-size chunk.
    pub fn next_default_chunk(&mut self) -> io::Result<&[u8]> {
        let capacity = self.buffer.len();
        self.next_chunk(capacity)
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of times the end of the source has been reached.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
