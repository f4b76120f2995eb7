use moodlock_core::lock::{DEFAULT_JPEG_QUALITY, DEFAULT_LOCK_PADDING, DEFAULT_LOCK_TTL};
use moodlock_core::{
    FaceDetector, FaceLockManager, MoodInference, MoodSession, NativeFaceDetector, NoDelay,
    SystemClock, ThreadSleep,
};
use moodlock_core::clock::Delay;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration: defaults, then an optional TOML file, then
/// `MOODLOCK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a face lock stays valid, in milliseconds.
    pub lock_ttl_ms: u64,
    /// Pixels added on every side of the face region when snapshotting.
    pub lock_padding: u32,
    /// Cadence at which consumers poll detection, in milliseconds.
    pub detect_interval_ms: u64,
    /// Frames are resized to fit within this before analysis.
    pub max_frame_width: u32,
    pub max_frame_height: u32,
    /// JPEG quality (1–100) of the lock snapshot.
    pub jpeg_quality: u8,
    /// Whether mood inference sleeps for its simulated latency.
    pub simulate_latency: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_ttl_ms: DEFAULT_LOCK_TTL.as_millis() as u64,
            lock_padding: DEFAULT_LOCK_PADDING,
            detect_interval_ms: 800,
            max_frame_width: moodlock_core::frame::MAX_ANALYSIS_WIDTH,
            max_frame_height: moodlock_core::frame::MAX_ANALYSIS_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            simulate_latency: true,
        }
    }
}

impl Config {
    /// Load from `MOODLOCK_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("MOODLOCK_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse TOML; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `MOODLOCK_*` variables resolved through `lookup`.
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let parse = |key: &str| lookup(key).map(|v| v.trim().to_string());

        if let Some(v) = parse("MOODLOCK_LOCK_TTL_MS").and_then(|v| v.parse().ok()) {
            self.lock_ttl_ms = v;
        }
        if let Some(v) = parse("MOODLOCK_LOCK_PADDING").and_then(|v| v.parse().ok()) {
            self.lock_padding = v;
        }
        if let Some(v) = parse("MOODLOCK_DETECT_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.detect_interval_ms = v;
        }
        if let Some(v) = parse("MOODLOCK_MAX_FRAME_WIDTH").and_then(|v| v.parse().ok()) {
            self.max_frame_width = v;
        }
        if let Some(v) = parse("MOODLOCK_MAX_FRAME_HEIGHT").and_then(|v| v.parse().ok()) {
            self.max_frame_height = v;
        }
        if let Some(v) = parse("MOODLOCK_JPEG_QUALITY").and_then(|v| v.parse().ok()) {
            self.jpeg_quality = v;
        }
        if let Some(v) = parse("MOODLOCK_SIMULATE_LATENCY").and_then(|v| parse_flag(&v)) {
            self.simulate_latency = v;
        }
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_millis(self.lock_ttl_ms)
    }

    pub fn detect_interval(&self) -> Duration {
        Duration::from_millis(self.detect_interval_ms.max(1))
    }

    /// Build a session on the system clock with this configuration.
    pub fn build_session(&self, native: Option<Box<dyn NativeFaceDetector>>) -> MoodSession {
        let detector = match native {
            Some(n) => FaceDetector::with_native(n),
            None => FaceDetector::heuristic(),
        }
        .with_max_dimensions(self.max_frame_width, self.max_frame_height);

        let locks = FaceLockManager::new(Arc::new(SystemClock))
            .with_ttl(self.lock_ttl())
            .with_padding(self.lock_padding)
            .with_jpeg_quality(self.jpeg_quality);

        let delay: Arc<dyn Delay> = if self.simulate_latency {
            Arc::new(ThreadSleep)
        } else {
            Arc::new(NoDelay)
        };
        let mood = MoodInference::new(
            Arc::new(SystemClock),
            delay,
            Box::new(StdRng::from_entropy()),
        );

        MoodSession::new(detector, locks, mood)
    }
}

/// `1`/`true`/`yes`/`on` or `0`/`false`/`no`/`off`, case-insensitive.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.lock_ttl(), Duration::from_secs(30));
        assert_eq!(config.lock_padding, 20);
        assert_eq!(config.detect_interval(), Duration::from_millis(800));
        assert_eq!((config.max_frame_width, config.max_frame_height), (640, 480));
        assert_eq!(config.jpeg_quality, 90);
        assert!(config.simulate_latency);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config =
            Config::from_toml_str("lock_ttl_ms = 5000\nsimulate_latency = false\n").unwrap();
        assert_eq!(config.lock_ttl_ms, 5000);
        assert!(!config.simulate_latency);
        assert_eq!(config.lock_padding, 20);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml_str("lock_ttl_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/moodlock.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MOODLOCK_LOCK_TTL_MS", "10000"),
            ("MOODLOCK_LOCK_PADDING", " 8 "),
            ("MOODLOCK_JPEG_QUALITY", "not-a-number"),
            ("MOODLOCK_SIMULATE_LATENCY", "0"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.lock_ttl_ms, 10_000);
        assert_eq!(config.lock_padding, 8);
        assert_eq!(config.jpeg_quality, 90);
        assert!(!config.simulate_latency);
        assert_eq!(config.detect_interval_ms, 800);
    }

    #[test]
    fn test_latency_flag_spellings() {
        for (raw, expected) in [("false", false), ("No", false), ("off", false), ("TRUE", true)] {
            let mut config = Config {
                simulate_latency: !expected,
                ..Config::default()
            };
            config.apply_env(|k| (k == "MOODLOCK_SIMULATE_LATENCY").then(|| raw.to_string()));
            assert_eq!(config.simulate_latency, expected, "value {raw}");
        }

        let mut config = Config::default();
        config.apply_env(|k| (k == "MOODLOCK_SIMULATE_LATENCY").then(|| "maybe".to_string()));
        assert!(config.simulate_latency);
    }

    #[test]
    fn test_build_session_applies_ttl() {
        let config = Config {
            lock_ttl_ms: 1234,
            ..Config::default()
        };
        let mut session = config.build_session(None);
        assert_eq!(session.lock_manager().ttl(), Duration::from_millis(1234));
        assert!(!session.has_valid_lock());
    }
}
