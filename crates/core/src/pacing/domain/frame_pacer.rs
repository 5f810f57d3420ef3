use crate::shared::config::PlayerConfig;
use crate::shared::constants::{
    DEFAULT_TICK_RATE, FRAME_PERIOD_CALIBRATION, FRAME_PERIOD_TIME_BASE,
};

/// Constants converting a decoder frame period into a per-tick increment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingConfig {
    pub calibration_constant: f64,
    pub time_base: f64,
    pub tick_rate: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            calibration_constant: FRAME_PERIOD_CALIBRATION,
            time_base: FRAME_PERIOD_TIME_BASE,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

impl From<&PlayerConfig> for PacingConfig {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            calibration_constant: config.calibration_constant,
            time_base: config.time_base,
            tick_rate: config.tick_rate,
        }
    }
}

impl PacingConfig {
    /// Fraction of a picture to advance per presentation tick.
    pub fn increment_for(&self, frame_period: u32) -> f64 {
        frame_period as f64 / (self.calibration_constant * self.time_base * self.tick_rate as f64)
    }
}

/// Fractional accumulator deciding on which ticks the picture advances.
///
/// Until calibrated the increment is 1.0, so every tick advances and the
/// first picture (and with it the stream metadata) arrives on tick one.
#[derive(Debug)]
pub struct FramePacer {
    config: PacingConfig,
    accumulator: f64,
    increment: f64,
    calibrated: bool,
}

impl FramePacer {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            accumulator: 1.0,
            increment: 1.0,
            calibrated: false,
        }
    }

    /// Derives the per-tick increment from the stream's frame period.
    /// Only the first call has any effect.
    pub fn calibrate(&mut self, frame_period: u32) {
        if self.calibrated {
            return;
        }
        self.calibrated = true;

        let increment = self.config.increment_for(frame_period);
        if increment.is_finite() && increment > 0.0 {
            self.increment = increment;
        } else {
            log::warn!("frame period {frame_period} gives no usable increment, advancing every tick");
        }
        log::info!(
            "pacing: frame period {frame_period}, {:.4} pictures per tick at {} Hz",
            self.increment,
            self.config.tick_rate
        );
    }

    /// Accumulates one tick. Returns `true` when the picture should advance;
    /// the surplus over 1.0 carries into later ticks.
    pub fn tick(&mut self) -> bool {
        self.accumulator += self.increment;
        if self.accumulator > 1.0 {
            self.accumulator -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}
