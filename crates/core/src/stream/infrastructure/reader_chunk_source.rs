use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::shared::error::{PlaybackError, Result};
use crate::stream::domain::chunk_source::ChunkSource;

/// Chunk source over any seekable reader.
pub struct ReaderChunkSource<R: Read + Seek> {
    inner: R,
}

/// File-backed source used for the configured input path.
pub type FileChunkSource = ReaderChunkSource<File>;

impl<R: Read + Seek> ReaderChunkSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl ReaderChunkSource<File> {
    /// Opens `path` for reading. Failure here is fatal to a session.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PlaybackError::StreamOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl ReaderChunkSource<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ChunkSource for ReaderChunkSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0)).map(|_| ())
    }
}
