/// Path played when neither the CLI nor the config file names an input.
pub const DEFAULT_INPUT_PATH: &str = "data/eq.mpg";

/// Bytes handed to the decoder per NEED_DATA request.
pub const CHUNK_SIZE: usize = 4096;

/// Fixed presentation tick frequency (ticks per second).
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Divisor applied to the decoder's 27 MHz frame period before the
/// time-base and tick-rate conversion. Depends on the decoder's unit system.
pub const FRAME_PERIOD_CALIBRATION: f64 = 37.04;

/// Second divisor of the frame-period conversion (decoder ticks to ms scale).
pub const FRAME_PERIOD_TIME_BASE: f64 = 1000.0;

pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;

/// Consecutive loop boundaries without a picture before a session is
/// declared stalled.
pub const DEFAULT_MAX_EMPTY_LOOPS: u32 = 2;

/// Bytes per pixel of the packed RGB output layout.
pub const RGB_CHANNELS: usize = 3;
