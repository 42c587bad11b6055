//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while building the monitor graph
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("Delay of {seconds}s exceeds line capacity of {max_seconds}s")]
    DelayTooLong { seconds: f32, max_seconds: f32 },

    #[error("Unknown preset: {0} (expected NORMAL, ECHO, ROOM or STAGE)")]
    UnknownPreset(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::InvalidSampleRate(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = DspError::InvalidCoefficients {
            frequency: 2800.0,
            sample_rate: 4000.0,
        };
        assert!(err.to_string().contains("2800"));

        let err = DspError::UnknownPreset("karaoke".into());
        assert!(err.to_string().contains("karaoke"));
    }
}
