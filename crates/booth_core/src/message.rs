//! Message Types for Thread Communication
//!
//! Commands flow from the front desk -> SessionController
//! Events flow from the engine and controller -> front desk

use serde::{Deserialize, Serialize};

use crate::session::Phase;
use booth_dsp::BoothPreset;

/// Commands accepted by [`crate::SessionController::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start the engine and begin the countdown
    InsertCoin,

    /// End the session early, leaving the monitor running
    StopSession,

    /// Tear everything down and return to IDLE
    Reset,

    SetPreset(BoothPreset),

    /// Monitor volume (0.0 - 2.0)
    SetVolume(f32),

    /// Echo amount (0.0 - 1.0)
    SetEcho(f32),

    /// Room amount (0.0 - 1.0)
    SetRoom(f32),

    ToggleMute,

    /// Reset the booth and leave the front desk loop
    Shutdown,
}

/// Events sent to whoever presents the booth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Session phase changed
    PhaseChanged { phase: Phase },

    /// Whole seconds until the booth goes LIVE
    CountdownTick { seconds: u64 },

    /// Whole seconds of LIVE time left
    RemainingTick { seconds: u64 },

    /// Capture and monitor graph are up
    EngineStarted { sample_rate: u32 },

    /// Capture released and graph torn down
    EngineStopped,

    /// Inserting a coin failed to start the engine
    StartFailed { message: String },

    MuteChanged { muted: bool },

    /// Output peak of the monitor (0.0 - 1.0 nominal)
    LevelUpdate { peak: f32 },

    /// Error reported by the audio backend while streaming
    StreamError { message: String },

    /// Monitor output ran dry (audio glitch)
    BufferUnderrun,

    /// Capture ring was full, microphone samples were dropped
    BufferOverrun,
}

impl Event {
    /// Create a stream error event from any error type
    pub fn stream_error<E: std::fmt::Display>(err: E) -> Self {
        Event::StreamError {
            message: err.to_string(),
        }
    }
}
