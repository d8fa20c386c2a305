use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    animation::{
        events::millis,
        state::{SMOOTHING_FACTOR, TIME_STEP},
    },
    effect::params::ParameterSet,
    error::{ConfigError, Result},
    surface::{backend::MAX_SURFACE_DIMENSION, types::Color},
};

/// Highest accepted frame rate (Hz)
pub const MAX_REFRESH_RATE: f64 = 1000.0;

/// Main configuration for vhs-glitch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial values of the effect tunables
    pub params: ParameterSet,

    /// Frame timing and smoothing
    pub playback: PlaybackConfig,

    /// Glitch event timing
    pub scheduler: SchedulerConfig,

    /// Output surface
    pub surface: SurfaceConfig,

    /// Frame output
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;
        self.scheduler.validate()?;
        self.surface.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Frame timing and intensity smoothing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Animation clock advance per frame (seconds)
    pub time_step: f32,

    /// Fraction of the intensity gap closed per frame
    pub smoothing_factor: f32,

    /// Frame ticks per second of virtual time
    pub refresh_rate: f64,

    /// Clear colour behind the image
    pub background: Color,

    /// Pace frame ticks against the wall clock
    pub realtime: bool,

    /// Stop after this many frames (unbounded when absent)
    pub max_frames: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            time_step: TIME_STEP,
            smoothing_factor: SMOOTHING_FACTOR,
            refresh_rate: 60.0,
            background: Color::WHITE,
            realtime: false,
            max_frames: None,
        }
    }
}

impl PlaybackConfig {
    fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "playback.time_step".to_string(),
                value: self.time_step.to_string()
            }.into());
        }

        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "playback.smoothing_factor".to_string(),
                value: self.smoothing_factor.to_string()
            }.into());
        }

        if !(self.refresh_rate > 0.0 && self.refresh_rate <= MAX_REFRESH_RATE) {
            return Err(ConfigError::InvalidValue {
                key: "playback.refresh_rate".to_string(),
                value: self.refresh_rate.to_string()
            }.into());
        }

        if self.background.0.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::InvalidValue {
                key: "playback.background".to_string(),
                value: format!("{:?}", self.background.0)
            }.into());
        }

        Ok(())
    }

    /// Virtual time between two frame ticks, rounded to the clock's microsecond
    ///
    /// Never zero, so frame ticks always move the clock forward.
    pub fn frame_interval(&self) -> std::time::Duration {
        millis(1000.0 / self.refresh_rate).max(std::time::Duration::from_micros(1))
    }
}

/// Glitch scheduler timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Shortest wait between wake-ups (ms)
    pub base_delay_ms: f64,

    /// Extra random wait at zero frequency (ms)
    pub delay_spread_ms: f64,

    /// RNG seed; runs with the same seed glitch identically
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1500.0,
            delay_spread_ms: 4000.0,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    fn validate(&self) -> Result<()> {
        if !(self.base_delay_ms.is_finite() && self.base_delay_ms > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.base_delay_ms".to_string(),
                value: self.base_delay_ms.to_string()
            }.into());
        }

        if !(self.delay_spread_ms.is_finite() && self.delay_spread_ms >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.delay_spread_ms".to_string(),
                value: self.delay_spread_ms.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Output surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,

    /// Threads used to rasterize a frame
    pub render_threads: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            render_threads: num_cpus::get(),
        }
    }
}

impl SurfaceConfig {
    fn validate(&self) -> Result<()> {
        let in_range = |v: u32| v > 0 && v <= MAX_SURFACE_DIMENSION;
        if !in_range(self.width) || !in_range(self.height) {
            return Err(ConfigError::InvalidValue {
                key: "surface.size".to_string(),
                value: format!("{}x{}", self.width, self.height)
            }.into());
        }

        if self.render_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "surface.render_threads".to_string(),
                value: self.render_threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Where rendered frames go
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the PNG sequence; nothing is written when absent
    pub dir: Option<PathBuf>,

    /// Write every Nth drawn frame
    pub every_n_frames: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            every_n_frames: 1,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.every_n_frames == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.every_n_frames".to_string(),
                value: self.every_n_frames.to_string()
            }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::params::{SCANLINE_SPEED, VIGNETTE_STRENGTH};
    use tempfile::tempdir;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.params.set(SCANLINE_SPEED, 0.6).unwrap();
        original_config.scheduler.seed = Some(42);

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.params, original_config.params);
        assert_eq!(loaded_config.scheduler.seed, Some(42));
        assert_eq!(loaded_config.surface.width, original_config.surface.width);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            "[params]\nvignette_strength = 0.5\n\n[surface]\nwidth = 320\n",
        ).unwrap();
        assert_eq!(config.params.get_f32(VIGNETTE_STRENGTH), Some(0.5));
        assert_eq!(config.surface.width, 320);
        assert_eq!(config.surface.height, 360);
        assert_eq!(config.playback.smoothing_factor, 0.1);
    }

    #[test]
    fn test_unknown_parameter_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        std::fs::write(&file_path, "[params]\nbloom = 1.0\n").unwrap();
        assert!(Config::from_file(&file_path).is_err());
    }

    #[test]
    fn test_invalid_smoothing() {
        let mut config = Config::default();
        config.playback.smoothing_factor = 0.0;
        assert!(config.validate().is_err());
        config.playback.smoothing_factor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_surface() {
        let mut config = Config::default();
        config.surface.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_refresh_rate() {
        let mut config = Config::default();
        for rate in [0.0, -60.0, f64::NAN, f64::INFINITY, 5_000_000.0] {
            config.playback.refresh_rate = rate;
            assert!(config.validate().is_err(), "rate {} accepted", rate);
        }
        config.playback.refresh_rate = MAX_REFRESH_RATE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frame_interval() {
        let playback = PlaybackConfig { refresh_rate: 50.0, ..PlaybackConfig::default() };
        assert_eq!(playback.frame_interval(), Duration::from_micros(20_000));

        // Rounded to whole microseconds like the event clock
        let playback = PlaybackConfig { refresh_rate: 60.0, ..PlaybackConfig::default() };
        assert_eq!(playback.frame_interval(), Duration::from_micros(16_667));

        let playback = PlaybackConfig { refresh_rate: 5_000_000.0, ..PlaybackConfig::default() };
        assert_eq!(playback.frame_interval(), Duration::from_micros(1));
    }
}
