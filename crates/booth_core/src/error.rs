//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the audio engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Microphone permission denied, disconnected or absent
    #[error("Capture device unavailable: {0}")]
    CaptureDevice(String),

    /// No audio runtime to process the monitor signal with
    #[error("Audio processing not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to build monitor output stream: {0}")]
    StreamBuildError(String),

    /// Session timing that cannot be scheduled on this clock
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("DSP error: {0}")]
    DspError(#[from] booth_dsp::DspError),

    #[error("Capture thread terminated unexpectedly")]
    CaptureThreadLost,
}

impl EngineError {
    /// Whether the user can fix this by granting access or plugging in a microphone
    pub fn is_capture_failure(&self) -> bool {
        matches!(self, EngineError::CaptureDevice(_))
    }

    /// Collapse a failure on the open path into one of the two start failures
    ///
    /// Anything about the devices or the requested format (including a
    /// sample rate the voice chain rejects) is a capture failure. A dead
    /// capture thread means there is no working audio runtime.
    pub fn into_start_failure(self) -> EngineError {
        match self {
            EngineError::CaptureDevice(_) | EngineError::UnsupportedPlatform(_) => self,
            EngineError::CaptureThreadLost => EngineError::UnsupportedPlatform(self.to_string()),
            EngineError::NoDevicesFound
            | EngineError::DeviceNotFound(_)
            | EngineError::StreamBuildError(_)
            | EngineError::ConfigError(_)
            | EngineError::DspError(_) => EngineError::CaptureDevice(self.to_string()),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::CaptureDevice("permission denied".into());
        assert!(err.to_string().contains("permission denied"));

        let err = EngineError::UnsupportedPlatform("no audio hosts".into());
        assert!(err.to_string().contains("no audio hosts"));
    }

    #[test]
    fn test_error_from_dsp() {
        let dsp_err = booth_dsp::DspError::InvalidSampleRate(0.0);
        let engine_err: EngineError = dsp_err.into();
        assert!(matches!(engine_err, EngineError::DspError(_)));
    }

    #[test]
    fn test_capture_failure_classification() {
        assert!(EngineError::CaptureDevice("x".into()).is_capture_failure());
        assert!(!EngineError::UnsupportedPlatform("x".into()).is_capture_failure());
        assert!(!EngineError::CaptureThreadLost.is_capture_failure());
        assert!(!EngineError::DeviceNotFound("Headphones".into()).is_capture_failure());
    }

    #[test]
    fn test_start_failure_mapping() {
        let kept = EngineError::CaptureDevice("permission denied".into()).into_start_failure();
        assert!(matches!(kept, EngineError::CaptureDevice(ref m) if m == "permission denied"));

        let kept = EngineError::UnsupportedPlatform("no audio hosts".into()).into_start_failure();
        assert!(matches!(kept, EngineError::UnsupportedPlatform(ref m) if m == "no audio hosts"));

        let lost = EngineError::CaptureThreadLost.into_start_failure();
        assert!(matches!(lost, EngineError::UnsupportedPlatform(_)));

        let capture = [
            EngineError::NoDevicesFound,
            EngineError::DeviceNotFound("Headphones".into()),
            EngineError::StreamBuildError("format rejected".into()),
            EngineError::ConfigError("bad deadline".into()),
            EngineError::DspError(booth_dsp::DspError::InvalidSampleRate(0.0)),
        ];
        for err in capture {
            let message = err.to_string();
            let mapped = err.into_start_failure();
            assert!(mapped.is_capture_failure(), "{} was not a capture failure", message);
            assert!(mapped.to_string().contains(&message));
        }
    }
}
