//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - Default values (built into the code)
//! - TOML configuration file (config.toml)
//! - Environment variables (with APP_ prefix)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_LINK_URL, APP_SPEECH_MODE, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! Timing values default to the tuned constants of the pipeline (0.4s connect
//! grace, 8s keepalive, 0.5s→6s backoff, 1.3s debounce, …) and are exposed so
//! demos and tests can compress them.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{LinkError, LinkResult};

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub link: LinkConfig,
    pub motion: MotionConfig,
    pub speech: SpeechConfig,
}

/// Connection manager settings.
///
/// ## Fields:
/// - `url`: WebSocket endpoint of the remote controller (ws:// or wss://)
/// - `hello_from`: client identifier carried in the handshake frame
/// - `connect_timeout_ms`: how long one dial attempt may take
/// - `connect_grace_ms`: delay before optimistically reporting `connected`
/// - `keepalive_interval_ms`: period of the bare-text ping
/// - `backoff_initial_ms` / `backoff_max_ms`: reconnect delay range
/// - `outbound_capacity`: bounded depth of the outbound message funnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub url: String,
    pub hello_from: String,
    pub connect_timeout_ms: u64,
    pub connect_grace_ms: u64,
    pub keepalive_interval_ms: u64,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    pub outbound_capacity: usize,
}

/// Motion encoder settings.
///
/// ## Fields:
/// - `sample_rate_hz`: sensor sampling rate; also the tilt emission cap
/// - `tap_threshold_g`: linear-acceleration magnitude that counts as a tap
/// - `tap_cooldown_ms`: minimum spacing between detected taps
/// - `invert_pitch`: flip the sensor's pitch sign so forward tilt is positive
/// - `simulate`: drive the pipeline from the built-in simulated sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    pub sample_rate_hz: f64,
    pub tap_threshold_g: f64,
    pub tap_cooldown_ms: u64,
    pub invert_pitch: bool,
    pub simulate: bool,
}

/// Speech normalizer settings.
///
/// ## Fields:
/// - `mode`: continuous (partials delivered) or push-to-talk (finals only)
/// - `debounce_ms`: stability pause before a partial transcript is committed
/// - `repeat_ignore_ms`: window in which a partial equal to the last sent
///   command is ignored instead of re-arming the debounce
/// - `dedup_window_ms`: window in which an identical command is dropped
/// - `restart_delay_ms`: pause between recognition teardown and restart
/// - `simulate` / `script`: drive the pipeline from a scripted phrase list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub mode: SpeechMode,
    pub debounce_ms: u64,
    pub repeat_ignore_ms: u64,
    pub dedup_window_ms: u64,
    pub restart_delay_ms: u64,
    pub simulate: bool,
    pub script: Vec<String>,
}

/// Delivery mode for transcript candidates. Fixed for the lifetime of one
/// recognition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechMode {
    /// Partial results are delivered and debounced into commands
    Continuous,
    /// Only final results are acted upon
    PushToTalk,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig {
                url: "ws://127.0.0.1:8765".to_string(),
                hello_from: "ios".to_string(),
                connect_timeout_ms: 4000,
                connect_grace_ms: 400,
                keepalive_interval_ms: 8000,
                backoff_initial_ms: 500,
                backoff_max_ms: 6000,
                outbound_capacity: 64,
            },
            motion: MotionConfig {
                sample_rate_hz: 60.0,
                tap_threshold_g: 1.10,
                tap_cooldown_ms: 250,
                invert_pitch: true,
                simulate: true,
            },
            speech: SpeechConfig {
                mode: SpeechMode::Continuous,
                debounce_ms: 1300,
                repeat_ignore_ms: 800,
                dedup_window_ms: 1000,
                restart_delay_ms: 150,
                simulate: true,
                script: vec![
                    "open gmail".to_string(),
                    "type Hello from the handsfree client".to_string(),
                    "open twitter.com".to_string(),
                ],
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle the bare LINK_URL variable as a quick demo override
    ///
    /// ## Environment Variable Examples:
    /// - `APP_LINK_URL=ws://10.0.0.5:8765`: point at a different controller
    /// - `APP_SPEECH_MODE=push_to_talk`: suppress partial transcripts
    /// - `APP_MOTION_SIMULATE=false`: expect a real motion source
    pub fn load() -> LinkResult<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Bare LINK_URL is accepted without the APP_ prefix so demos can be
        // pointed at a controller with a single variable
        if let Ok(url) = env::var("LINK_URL") {
            settings = settings.set_override("link.url", url)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - The endpoint URL uses a WebSocket scheme
    /// - The motion sample rate is positive (it defines the throttle period)
    /// - The debounce pause is non-zero (zero would commit every partial)
    /// - The backoff range is ordered and non-degenerate
    /// - The outbound funnel has room for at least one message
    pub fn validate(&self) -> LinkResult<()> {
        if !self.link.url.starts_with("ws://") && !self.link.url.starts_with("wss://") {
            return Err(LinkError::Config(format!(
                "link.url must be a ws:// or wss:// endpoint, got '{}'",
                self.link.url
            )));
        }

        if self.motion.sample_rate_hz <= 0.0 {
            return Err(LinkError::Config(
                "motion.sample_rate_hz must be greater than 0".to_string(),
            ));
        }

        if self.speech.debounce_ms == 0 {
            return Err(LinkError::Config(
                "speech.debounce_ms must be greater than 0".to_string(),
            ));
        }

        if self.link.backoff_initial_ms == 0 || self.link.backoff_max_ms < self.link.backoff_initial_ms {
            return Err(LinkError::Config(
                "link backoff range must satisfy 0 < initial <= max".to_string(),
            ));
        }

        if self.link.outbound_capacity == 0 {
            return Err(LinkError::Config(
                "link.outbound_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl LinkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn connect_grace(&self) -> Duration {
        Duration::from_millis(self.connect_grace_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

impl MotionConfig {
    /// Target emission period derived from the sample rate.
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sample_rate_hz)
    }

    pub fn tap_cooldown(&self) -> Duration {
        Duration::from_millis(self.tap_cooldown_ms)
    }
}

impl SpeechConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn repeat_ignore(&self) -> Duration {
        Duration::from_millis(self.repeat_ignore_ms)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.link.url, "ws://127.0.0.1:8765");
        assert_eq!(config.link.hello_from, "ios");
        assert_eq!(config.link.backoff_initial_ms, 500);
        assert_eq!(config.link.backoff_max_ms, 6000);
        assert_eq!(config.motion.sample_rate_hz, 60.0);
        assert_eq!(config.speech.mode, SpeechMode::Continuous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.link.url = "http://127.0.0.1:8765".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.motion.sample_rate_hz = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.link.backoff_max_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_period() {
        let config = AppConfig::default();
        let period = config.motion.sample_period();
        // 60 Hz -> 16.67ms
        assert!(period > Duration::from_millis(16));
        assert!(period < Duration::from_millis(17));
    }

    #[test]
    fn test_speech_mode_parsing() {
        let mode: SpeechMode = serde_json::from_str(r#""push_to_talk""#).unwrap();
        assert_eq!(mode, SpeechMode::PushToTalk);

        let mode: SpeechMode = serde_json::from_str(r#""continuous""#).unwrap();
        assert_eq!(mode, SpeechMode::Continuous);
    }
}
