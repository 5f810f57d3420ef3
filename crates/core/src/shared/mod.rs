pub mod config;
pub mod constants;
pub mod error;
pub mod picture;
pub mod stream_metadata;
