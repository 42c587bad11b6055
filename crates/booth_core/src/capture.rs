//! Capture Backend Abstraction
//!
//! The engine never talks to an audio API directly. A [`CaptureBackend`]
//! opens the microphone, builds the monitor graph once the negotiated
//! sample rate is known, and hands back a [`CaptureHandle`] that keeps
//! audio flowing until it is closed.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, LatencyHint};
use crate::error::EngineResult;
use crate::message::Event;
use booth_dsp::MonitorGraph;

/// Voice processing requested from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub channel_count: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl CaptureConstraints {
    /// Untouched voice for headphone monitoring
    pub fn raw() -> Self {
        Self {
            channel_count: 1,
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
        }
    }

    /// Platform cleanup enabled for speaker monitoring
    pub fn assisted() -> Self {
        Self {
            channel_count: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }

    pub fn for_mode(prefer_headphone_mode: bool) -> Self {
        if prefer_headphone_mode {
            Self::raw()
        } else {
            Self::assisted()
        }
    }
}

/// Everything a backend needs to open the microphone
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub constraints: CaptureConstraints,
    pub latency_hint: LatencyHint,
    pub sample_rate: Option<u32>,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

impl CaptureRequest {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            constraints: CaptureConstraints::for_mode(config.prefer_headphone_mode),
            latency_hint: config.latency_hint,
            sample_rate: config.forced_sample_rate,
            input_device: config.input_device.clone(),
            output_device: config.output_device.clone(),
        }
    }
}

/// Best-effort latency report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyEstimate {
    pub sample_rate: u32,
    /// Buffering between capture and processing, in seconds
    pub base_latency: Option<f64>,
    /// Time from processing to the speaker, in seconds
    pub output_latency: Option<f64>,
}

/// Builds the monitor graph for the negotiated sample rate
pub type GraphFactory = Box<dyn FnOnce(u32) -> EngineResult<MonitorGraph> + Send>;

/// Opens capture streams
pub trait CaptureBackend: Send {
    fn name(&self) -> &'static str;

    /// Acquire the microphone and start monitoring.
    ///
    /// On error nothing stays attached: no stream, no graph.
    fn open(
        &mut self,
        request: &CaptureRequest,
        graph: GraphFactory,
        events: Sender<Event>,
    ) -> EngineResult<Box<dyn CaptureHandle>>;
}

/// A live capture + monitor stream
pub trait CaptureHandle: Send {
    fn sample_rate(&self) -> u32;

    fn latency(&self) -> LatencyEstimate;

    /// Release the microphone and destroy every stage
    fn close(self: Box<Self>) -> EngineResult<()>;
}
