//! Booth Core - Audio Engine and Session Timing
//!
//! This crate runs one karaoke booth:
//! - Microphone capture and monitor output (via cpal)
//! - The live vocal chain from `booth_dsp`, fed through a lock-free ring
//! - The rental state machine (IDLE → COUNTDOWN → LIVE → ENDED)
//! - Commands in, events out over crossbeam channels
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │  front desk ──Command──▶ SessionController ──Event──▶ UI    │
//! │                              │ owns                         │
//! │                              ▼                              │
//! │        AudioEngine (LiveParameters ──atomics──▶ graph)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ CaptureBackend
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Threads                          │
//! │   Microphone ──rtrb──▶ MonitorGraph ──▶ Headphones          │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod capture;
mod clock;
mod config;
mod device;
mod engine;
mod error;
mod message;
mod session;
mod stream;

#[cfg(test)]
mod testing;

pub use capture::{
    CaptureBackend, CaptureConstraints, CaptureHandle, CaptureRequest, GraphFactory,
    LatencyEstimate,
};
pub use clock::{ceil_seconds, seconds_until, Clock, ManualClock, MonotonicClock};
pub use config::{BoothConfig, EngineConfig, LatencyHint, SessionConfig, MAX_SESSION_LENGTH};
pub use device::{AudioDevice, DeviceType};
pub use engine::AudioEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use session::{format_mm_ss, BoothSnapshot, Phase, SessionController, TickOutcome};
pub use stream::CpalBackend;

// Re-export DSP types for convenience
pub use booth_dsp::{BoothPreset, LiveParameters, PRESETS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _config = BoothConfig::default();
        let _clock = ManualClock::new();
        assert_eq!(Phase::Idle.name(), "IDLE");
    }
}
