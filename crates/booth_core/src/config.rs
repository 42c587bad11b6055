//! Engine and Session Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Requested trade-off between latency and stability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyHint {
    /// Smallest buffer the device accepts
    Interactive,
    /// Host default buffer
    Balanced,
    /// Large buffer, glitch-free over latency
    Playback,
    /// Target buffer duration in seconds
    Seconds(f32),
}

impl LatencyHint {
    /// Buffer size in frames to request, `None` for the host default
    pub fn buffer_frames(&self, sample_rate: u32) -> Option<u32> {
        match *self {
            LatencyHint::Interactive => Some(128),
            LatencyHint::Balanced => None,
            LatencyHint::Playback => Some(2048),
            LatencyHint::Seconds(seconds) => {
                Some(((seconds * sample_rate as f32).round() as u32).max(16))
            }
        }
    }
}

/// Audio engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Headphone monitoring: capture the raw voice with no platform cleanup
    pub prefer_headphone_mode: bool,

    pub latency_hint: LatencyHint,

    /// Run at this sample rate instead of the microphone's default
    pub forced_sample_rate: Option<u32>,

    /// Input device name (system default when `None`)
    #[serde(default)]
    pub input_device: Option<String>,

    /// Output device name (system default when `None`)
    #[serde(default)]
    pub output_device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefer_headphone_mode: true,
            latency_hint: LatencyHint::Seconds(0.01),
            forced_sample_rate: None,
            input_device: None,
            output_device: None,
        }
    }
}

impl EngineConfig {
    /// Monitoring through speakers: ask the platform for echo cancellation,
    /// noise suppression and auto gain
    pub fn speaker_mode() -> Self {
        Self {
            prefer_headphone_mode: false,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rate) = self.forced_sample_rate {
            if !(8000..=192000).contains(&rate) {
                return Err(format!("Invalid sample rate: {}", rate));
            }
        }
        if let LatencyHint::Seconds(seconds) = self.latency_hint {
            if !(seconds > 0.0 && seconds <= 1.0) {
                return Err(format!("Invalid latency hint: {}s", seconds));
            }
        }
        Ok(())
    }

    /// Copy with invalid fields replaced by their defaults
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();
        if let Some(rate) = config.forced_sample_rate {
            if !(8000..=192000).contains(&rate) {
                config.forced_sample_rate = None;
            }
        }
        if let LatencyHint::Seconds(seconds) = config.latency_hint {
            if !(seconds > 0.0 && seconds <= 1.0) {
                config.latency_hint = defaults.latency_hint;
            }
        }
        config
    }
}

/// Booth rental timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of the LIVE phase
    pub session_duration: Duration,

    /// Delay between inserting the coin and going LIVE
    pub countdown: Duration,

    /// Clock loop period (one display frame)
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_duration: Duration::from_secs(210),
            countdown: Duration::from_secs(3),
            tick_interval: Duration::from_millis(16),
        }
    }
}

/// Longest countdown or session a booth accepts
pub const MAX_SESSION_LENGTH: Duration = Duration::from_secs(24 * 60 * 60);

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.session_duration.is_zero() {
            return Err("Session duration must be positive".into());
        }
        if self.session_duration > MAX_SESSION_LENGTH {
            return Err(format!(
                "Session duration {:?} exceeds {:?}",
                self.session_duration, MAX_SESSION_LENGTH
            ));
        }
        if self.countdown > MAX_SESSION_LENGTH {
            return Err(format!(
                "Countdown {:?} exceeds {:?}",
                self.countdown, MAX_SESSION_LENGTH
            ));
        }
        if self.tick_interval.is_zero() || self.tick_interval > Duration::from_millis(100) {
            return Err(format!("Invalid tick interval: {:?}", self.tick_interval));
        }
        Ok(())
    }
}

/// Everything needed to open one booth
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoothConfig {
    pub engine: EngineConfig,
    pub session: SessionConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.prefer_headphone_mode);
        assert_eq!(config.latency_hint, LatencyHint::Seconds(0.01));
        assert_eq!(config.forced_sample_rate, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_speaker_mode() {
        let config = EngineConfig::speaker_mode();
        assert!(!config.prefer_headphone_mode);
        assert_eq!(config.latency_hint, EngineConfig::default().latency_hint);
    }

    #[test]
    fn test_buffer_frames() {
        assert_eq!(LatencyHint::Seconds(0.01).buffer_frames(48000), Some(480));
        assert_eq!(LatencyHint::Seconds(0.01).buffer_frames(44100), Some(441));
        assert_eq!(LatencyHint::Balanced.buffer_frames(48000), None);
        assert!(
            LatencyHint::Interactive.buffer_frames(48000) < LatencyHint::Playback.buffer_frames(48000)
        );
        // Tiny hints are floored
        assert_eq!(LatencyHint::Seconds(0.00001).buffer_frames(48000), Some(16));
    }

    #[test]
    fn test_validation() {
        let invalid_rate = EngineConfig {
            forced_sample_rate: Some(100),
            ..Default::default()
        };
        assert!(invalid_rate.validate().is_err());

        let invalid_hint = EngineConfig {
            latency_hint: LatencyHint::Seconds(-0.5),
            ..Default::default()
        };
        assert!(invalid_hint.validate().is_err());

        let nan_hint = EngineConfig {
            latency_hint: LatencyHint::Seconds(f32::NAN),
            ..Default::default()
        };
        assert!(nan_hint.validate().is_err());

        let forced = EngineConfig {
            forced_sample_rate: Some(44100),
            ..Default::default()
        };
        assert!(forced.validate().is_ok());
    }

    #[test]
    fn test_sanitized_replaces_invalid_fields() {
        let config = EngineConfig {
            prefer_headphone_mode: false,
            latency_hint: LatencyHint::Seconds(5.0),
            forced_sample_rate: Some(1),
            input_device: Some("USB Mic".into()),
            output_device: None,
        };
        let clean = config.sanitized();
        assert!(clean.validate().is_ok());
        assert!(!clean.prefer_headphone_mode);
        assert_eq!(clean.forced_sample_rate, None);
        assert_eq!(clean.input_device.as_deref(), Some("USB Mic"));
    }

    #[test]
    fn test_session_defaults() {
        let session = SessionConfig::default();
        assert_eq!(session.session_duration, Duration::from_secs(210));
        assert_eq!(session.countdown, Duration::from_secs(3));
        assert!(session.validate().is_ok());

        let bad = SessionConfig {
            session_duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_session_length_upper_bound() {
        let day = SessionConfig {
            session_duration: MAX_SESSION_LENGTH,
            countdown: MAX_SESSION_LENGTH,
            ..Default::default()
        };
        assert!(day.validate().is_ok());

        let huge_session = SessionConfig {
            session_duration: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(huge_session.validate().is_err());

        let huge_countdown = SessionConfig {
            countdown: MAX_SESSION_LENGTH + Duration::from_secs(1),
            ..Default::default()
        };
        assert!(huge_countdown.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = BoothConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: BoothConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_latency_hint_serialization() {
        let json = serde_json::to_string(&LatencyHint::Interactive).unwrap();
        assert_eq!(json, "\"interactive\"");
        let hint: LatencyHint = serde_json::from_str("{\"seconds\":0.02}").unwrap();
        assert_eq!(hint, LatencyHint::Seconds(0.02));
    }
}
