use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("could not open stream {path}: {source}")]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read stream: {0}")]
    StreamRead(#[source] std::io::Error),
    #[error("could not allocate a decoder object: {0}")]
    DecoderInit(String),
    #[error("decoder error: {0}")]
    Decode(String),
    #[error("display surface is already allocated")]
    SurfaceReallocation,
    #[error("display surface is not allocated yet")]
    SurfaceMissing,
    #[error("picture is {actual} bytes, surface expects {expected}")]
    PictureSize { expected: usize, actual: usize },
    #[error("renderer error: {0}")]
    Render(String),
    #[error("could not write snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
    #[error("no picture decoded after {loops} passes over the stream")]
    Stalled { loops: u32 },
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
