pub mod decode;
pub mod pacing;
pub mod playback;
pub mod shared;
pub mod stream;
pub mod surface;
