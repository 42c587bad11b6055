//! Audio Engine - Microphone Capture and Live Monitoring
//!
//! Owns the capture backend, the user's live parameters and the atomic
//! block the audio callback reads them from.
//!
//! # Lifecycle
//!
//! ```text
//! stopped --start()--> running --stop()--> stopped
//! ```
//!
//! `start()` and `stop()` take `&mut self`, so one engine can never run two
//! of them at once. Parameter setters work in both states: while stopped
//! they are remembered and written into the next graph before it processes
//! its first buffer.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureBackend, CaptureHandle, CaptureRequest, GraphFactory, LatencyEstimate};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::stream::CpalBackend;
use booth_dsp::{BoothPreset, LiveParameters, MonitorGraph, MonitorParams};

/// Capacity of the event channel. Senders never block; overflow is dropped.
const EVENT_CAPACITY: usize = 256;

/// Microphone → voice chain → headphones
pub struct AudioEngine {
    backend: Box<dyn CaptureBackend>,

    config: EngineConfig,

    /// What the user asked for; outlives every graph
    live: LiveParameters,

    /// What the audio callback reads
    params: Arc<MonitorParams>,

    /// Capture stream plus the graph it feeds, present iff running
    active: Option<Box<dyn CaptureHandle>>,

    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
}

impl AudioEngine {
    /// Create an engine on the system audio host with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_backend(config, Box::new(CpalBackend::new()))
    }

    /// Create an engine on a specific capture backend
    ///
    /// An invalid configuration is not fatal: offending fields fall back to
    /// their defaults.
    pub fn with_backend(config: EngineConfig, backend: Box<dyn CaptureBackend>) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Invalid engine configuration ({}), using defaults for bad fields", e);
                config.sanitized()
            }
        };

        let (event_sender, event_receiver) = bounded(EVENT_CAPACITY);
        let live = LiveParameters::default();
        let params = Arc::new(MonitorParams::new());
        live.apply_to(&params);

        Self {
            backend,
            config,
            live,
            params,
            active: None,
            event_sender,
            event_receiver,
        }
    }

    /// Acquire the microphone and build the monitor graph
    ///
    /// No-op when already running. On error nothing stays attached.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.active.is_some() {
            debug!("Engine already running");
            return Ok(());
        }

        info!(
            "Starting audio engine ({} backend, headphone-first: {})",
            self.backend.name(),
            self.config.prefer_headphone_mode
        );

        // Gains are in place before the first buffer is processed
        self.live.apply_to(&self.params);

        let params = Arc::clone(&self.params);
        let factory: GraphFactory = Box::new(move |rate| {
            MonitorGraph::build(rate as f32, params).map_err(EngineError::from)
        });
        let request = CaptureRequest::from_config(&self.config);

        match self.backend.open(&request, factory, self.event_sender.clone()) {
            Ok(handle) => {
                let sample_rate = handle.sample_rate();
                self.active = Some(handle);
                info!("Audio engine started at {} Hz", sample_rate);
                self.emit(Event::EngineStarted { sample_rate });
                Ok(())
            }
            Err(e) => {
                error!("Failed to start audio engine: {}", e);
                Err(e.into_start_failure())
            }
        }
    }

    /// Release the microphone and destroy every stage
    ///
    /// No-op when not running. Never fails: teardown errors are logged.
    pub fn stop(&mut self) {
        let Some(handle) = self.active.take() else {
            return;
        };

        info!("Stopping audio engine");
        if let Err(e) = handle.close() {
            warn!("Error while releasing capture: {}", e);
        }
        self.params.set_peak(0.0);
        self.emit(Event::EngineStopped);
    }

    /// Monitor volume, clamped to [0, 2]. Remembered while muted.
    pub fn set_volume(&mut self, volume: f32) {
        self.live.set_volume(volume);
        self.live.apply_to(&self.params);
    }

    /// Echo amount, clamped to [0, 1]
    pub fn set_echo(&mut self, amount: f32) {
        self.live.set_echo(amount);
        self.live.apply_to(&self.params);
    }

    /// Room amount, clamped to [0, 1]
    pub fn set_room(&mut self, amount: f32) {
        self.live.set_room(amount);
        self.live.apply_to(&self.params);
    }

    pub fn set_preset(&mut self, preset: BoothPreset) {
        debug!("Applying preset {}", preset);
        self.live.set_preset(preset);
        self.live.apply_to(&self.params);
    }

    /// Flip mute and return the new state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.live.toggle_mute();
        self.live.apply_to(&self.params);
        self.emit(Event::MuteChanged { muted });
        muted
    }

    /// Unmute if muted
    pub fn clear_mute(&mut self) {
        if self.live.is_muted() {
            self.toggle_mute();
        }
    }

    /// Takes effect on the next `start()`
    pub fn set_headphone_first(&mut self, headphone_first: bool) {
        self.config.prefer_headphone_mode = headphone_first;
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// `None` while stopped
    pub fn latency_estimate(&self) -> Option<LatencyEstimate> {
        self.active.as_ref().map(|handle| handle.latency())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn live(&self) -> &LiveParameters {
        &self.live
    }

    pub fn volume(&self) -> f32 {
        self.live.volume()
    }

    pub fn echo(&self) -> f32 {
        self.live.echo()
    }

    pub fn room(&self) -> f32 {
        self.live.room()
    }

    pub fn is_muted(&self) -> bool {
        self.live.is_muted()
    }

    pub fn preset(&self) -> BoothPreset {
        self.live.preset()
    }

    /// Gain the output stage currently applies
    pub fn output_gain(&self) -> f32 {
        self.params.output_gain()
    }

    pub fn echo_send_level(&self) -> f32 {
        self.params.echo_send()
    }

    pub fn room_send_level(&self) -> f32 {
        self.params.room_send()
    }

    /// Output peak of the most recent block, 0 while stopped
    pub fn peak_level(&self) -> f32 {
        self.params.peak()
    }

    /// Poll for events (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Queue an event without blocking; dropped when the channel is full
    pub(crate) fn emit(&self, event: Event) {
        if self.event_sender.try_send(event).is_err() {
            debug!("Event channel full, dropping event");
        }
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
