pub mod headless_gpu_renderer;
pub mod null_renderer;
pub mod snapshot_writer;
