//! Configuration for the Integrity Signal Engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Horizontal/vertical trip points for one estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisThresholds {
    pub x: f64,
    pub y: f64,
}

/// Score deductions per anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Per frame with no usable face
    pub no_face: f64,
    /// Per frame with more than one face
    pub multiple_faces: f64,
    /// Per hysteresis trip on sustained gaze/head deviation
    pub sustained_deviation: f64,
    /// Per tab switch reported by the host
    pub tab_switch: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            no_face: 1.0,
            multiple_faces: 5.0,
            sustained_deviation: 3.0,
            tab_switch: 10.0,
        }
    }
}

/// Tunables of the signal engine.
///
/// The defaults are the conservative variant of the heuristics. Every value
/// can be overridden per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Average eye-aspect-ratio under which a frame counts as a blink
    pub blink_threshold: f64,

    /// Normalized iris offset limits
    pub iris: AxisThresholds,

    /// Normalized nose offset limits
    pub head_pose: AxisThresholds,

    /// Eyes flatter than this (normalized frame height) are too compressed to
    /// read an iris position from
    pub min_eye_height: f64,

    /// Off-zone frames (net) tolerated before a deviation alert fires
    pub suspicion_threshold: u32,

    pub penalties: PenaltyConfig,

    /// Score recovered per centered frame
    pub recovery_per_centered_frame: f64,

    /// Identical alerts inside this window are dropped
    #[serde(with = "duration_millis")]
    pub alert_window: Duration,

    /// Apply no-face/multiple-face penalties only when their alert is dispatched
    pub throttle_penalties: bool,

    /// Swap Left/Right labels for mirrored camera feeds
    pub mirror_horizontal: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blink_threshold: 0.08,
            iris: AxisThresholds { x: 0.30, y: 0.35 },
            head_pose: AxisThresholds { x: 0.18, y: 0.22 },
            min_eye_height: 0.003,
            suspicion_threshold: 8,
            penalties: PenaltyConfig::default(),
            recovery_per_centered_frame: 0.1,
            alert_window: Duration::from_millis(1500),
            throttle_penalties: true,
            mirror_horizontal: false,
        }
    }
}

impl EngineConfig {
    /// Reject values that would make the engine misbehave at call time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("blink_threshold", self.blink_threshold),
            ("iris.x", self.iris.x),
            ("iris.y", self.iris.y),
            ("head_pose.x", self.head_pose.x),
            ("head_pose.y", self.head_pose.y),
            ("min_eye_height", self.min_eye_height),
            ("penalties.no_face", self.penalties.no_face),
            ("penalties.multiple_faces", self.penalties.multiple_faces),
            (
                "penalties.sustained_deviation",
                self.penalties.sustained_deviation,
            ),
            ("penalties.tab_switch", self.penalties.tab_switch),
            (
                "recovery_per_centered_frame",
                self.recovery_per_centered_frame,
            ),
        ];

        for (field, value) in checks {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("{value} is not a finite number"),
                });
            }
            if value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("{value} is negative"),
                });
            }
        }

        Ok(())
    }
}

/// Host configuration: engine tunables plus where to keep session files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,

    /// Path for writing session reports
    pub export_path: PathBuf,

    /// Path for the persistent session log
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("proctor-signal-engine");

        Self {
            engine: EngineConfig::default(),
            export_path: data_dir.join("reports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("proctor-signal-engine")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
