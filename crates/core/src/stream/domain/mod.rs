pub mod bitstream_reader;
pub mod chunk_source;
