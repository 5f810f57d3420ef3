pub mod ffmpeg_mpeg2_decoder;
pub mod mpeg2_splitter;
