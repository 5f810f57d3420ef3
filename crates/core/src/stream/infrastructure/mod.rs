pub mod reader_chunk_source;
