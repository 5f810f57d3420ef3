pub mod renderer;
pub mod snapshot_sink;
pub mod surface_publisher;
pub mod tick_clock;
