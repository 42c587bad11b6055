//! Monitor Graph
//!
//! The fixed signal topology of the booth, built by a single routine and
//! owned by the audio callback for its whole life.
//!
//! ```text
//!  Capture ─▶ HighPass ─▶ Presence ─▶ Compressor ─▶ OutputGain ─┬──────────────────▶ Monitor
//!                                                               │                      ▲  ▲
//!                                                               ├─▶ EchoSend ─▶ EchoDelay ─┘  │
//!                                                               │                 ▲    │      │
//!                                                               │                 └─ EchoFeedback
//!                                                               └─▶ RoomSend ─▶ RoomDelay ────┘
//! ```
//!
//! Sends are tapped after the output gain, so effect level tracks the
//! compressed signal and follows volume and mute. Their returns go straight
//! to the monitor and never re-enter the dry chain.

use std::sync::Arc;

use crate::compressor::{Compressor, CompressorSettings};
use crate::delay::DelayLine;
use crate::error::DspError;
use crate::filter::Filter;
use crate::params::MonitorParams;
use crate::processor::{ProcessContext, ProcessorChain};

/// Named stages of the monitor graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Capture,
    HighPass,
    Presence,
    Compressor,
    OutputGain,
    EchoSend,
    EchoDelay,
    EchoFeedback,
    RoomSend,
    RoomDelay,
    Monitor,
}

/// Directed edge between two stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: Stage,
    pub to: Stage,
}

const fn wire(from: Stage, to: Stage) -> Connection {
    Connection { from, to }
}

/// Every stage, in construction order
pub const STAGES: [Stage; 11] = [
    Stage::Capture,
    Stage::HighPass,
    Stage::Presence,
    Stage::Compressor,
    Stage::OutputGain,
    Stage::EchoSend,
    Stage::EchoDelay,
    Stage::EchoFeedback,
    Stage::RoomSend,
    Stage::RoomDelay,
    Stage::Monitor,
];

/// Wiring: dry chain first, then sends
pub const TOPOLOGY: [Connection; 13] = [
    wire(Stage::Capture, Stage::HighPass),
    wire(Stage::HighPass, Stage::Presence),
    wire(Stage::Presence, Stage::Compressor),
    wire(Stage::Compressor, Stage::OutputGain),
    wire(Stage::OutputGain, Stage::Monitor),
    wire(Stage::OutputGain, Stage::EchoSend),
    wire(Stage::EchoSend, Stage::EchoDelay),
    wire(Stage::EchoDelay, Stage::EchoFeedback),
    wire(Stage::EchoFeedback, Stage::EchoDelay),
    wire(Stage::EchoDelay, Stage::Monitor),
    wire(Stage::OutputGain, Stage::RoomSend),
    wire(Stage::RoomSend, Stage::RoomDelay),
    wire(Stage::RoomDelay, Stage::Monitor),
];

/// Fixed constants of the effect sends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendSettings {
    pub echo_delay: f32,
    pub echo_max_delay: f32,
    /// Loop gain of the echo feedback path, must stay below 1
    pub echo_feedback: f32,
    pub room_delay: f32,
    pub room_max_delay: f32,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            echo_delay: 0.14,
            echo_max_delay: 1.0,
            echo_feedback: 0.22,
            room_delay: 0.02,
            room_max_delay: 0.2,
        }
    }
}

/// Processing graph for one capture session
///
/// Owns every stage. Parameters are read from the shared [`MonitorParams`]
/// once per block.
pub struct MonitorGraph {
    dry: ProcessorChain,
    echo_delay: DelayLine,
    echo_feedback: f32,
    room_delay: DelayLine,
    params: Arc<MonitorParams>,
}

impl MonitorGraph {
    /// Build the graph with the stock voice chain
    pub fn build(sample_rate: f32, params: Arc<MonitorParams>) -> Result<Self, DspError> {
        Self::with_settings(
            sample_rate,
            CompressorSettings::default(),
            SendSettings::default(),
            params,
        )
    }

    pub fn with_settings(
        sample_rate: f32,
        compressor: CompressorSettings,
        sends: SendSettings,
        params: Arc<MonitorParams>,
    ) -> Result<Self, DspError> {
        if sample_rate.is_nan() || sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }

        let mut dry = ProcessorChain::new(ProcessContext::new(sample_rate));
        dry.add(Filter::high_pass(sample_rate)?);
        dry.add(Filter::presence(sample_rate)?);
        dry.add(Compressor::new(compressor, sample_rate));

        let echo_delay = DelayLine::with_delay(sends.echo_delay, sends.echo_max_delay, sample_rate)?;
        let room_delay = DelayLine::with_delay(sends.room_delay, sends.room_max_delay, sample_rate)?;

        Ok(Self {
            dry,
            echo_delay,
            echo_feedback: sends.echo_feedback.clamp(0.0, 0.99),
            room_delay,
            params,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.dry.context().sample_rate
    }

    /// Names of the dry-chain processors, in order
    pub fn dry_chain(&self) -> Vec<&'static str> {
        self.dry.names()
    }

    /// Process a mono block in-place: capture in, monitor out
    ///
    /// # Real-time Safety
    /// No allocations. O(n) where n = buffer length.
    pub fn process(&mut self, buffer: &mut [f32]) {
        self.dry.process(buffer);

        let gain = self.params.output_gain();
        let echo_send = self.params.echo_send();
        let room_send = self.params.room_send();

        let mut peak = 0.0_f32;
        for sample in buffer.iter_mut() {
            let dry = *sample * gain;

            let echo_out = self.echo_delay.read();
            self.echo_delay
                .write(dry * echo_send + echo_out * self.echo_feedback);

            let room_out = self.room_delay.read();
            self.room_delay.write(dry * room_send);

            let out = dry + echo_out + room_out;
            peak = peak.max(out.abs());
            *sample = out;
        }

        self.params.set_peak(peak);
    }

    /// Clear filter memory, envelopes and delay lines
    pub fn reset(&mut self) {
        self.dry.reset();
        self.echo_delay.reset();
        self.room_delay.reset();
    }
}
