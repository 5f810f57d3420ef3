pub mod decoder_adapter;
pub mod decoder_state;
pub mod incremental_decoder;
pub mod picture_sink;

#[cfg(test)]
pub(crate) mod test_support;
