//! Session Controller - the Booth Rental State Machine
//!
//! ```text
//!            insert coin              start deadline            end deadline
//!   IDLE ----------------> COUNTDOWN ----------------> LIVE ----------------> ENDED
//!    ^  ^                      |                         |                      |
//!    |  |                      +------ stop session -----+-------> ENDED        |
//!    |  +------------------------------ reset (from any phase) -----------------+
//!    +-- insert coin again from ENDED goes straight back to COUNTDOWN
//! ```
//!
//! The controller is a plain object driven by [`SessionController::tick`].
//! Whoever owns it decides how often to tick: [`SessionController::run_clock`]
//! is a blocking loop, the CLI interleaves ticks with stdin commands, tests
//! tick a [`ManualClock`](crate::clock::ManualClock).

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{ceil_seconds, seconds_until, Clock, MonotonicClock};
use crate::config::{BoothConfig, SessionConfig};
use crate::engine::AudioEngine;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use booth_dsp::BoothPreset;

/// Minimum spacing of `LevelUpdate` events
const LEVEL_INTERVAL: Duration = Duration::from_millis(100);

/// Where the booth is in its rental cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Idle,
    Countdown,
    Live,
    Ended,
}

impl Phase {
    /// Booth door is open while a paid session is in progress
    pub fn door_open(self) -> bool {
        matches!(self, Phase::Countdown | Phase::Live)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Countdown => "COUNTDOWN",
            Phase::Live => "LIVE",
            Phase::Ended => "ENDED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether the clock loop should keep ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stopped,
}

/// Everything a presentation layer shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoothSnapshot {
    pub phase: Phase,
    pub door_open: bool,
    pub countdown_seconds: u64,
    pub remaining_seconds: u64,
    /// `remaining_seconds` as `mm:ss`
    pub remaining_display: String,
    pub muted: bool,
    pub volume: f32,
    pub echo: f32,
    pub room: f32,
    pub preset: BoothPreset,
    pub engine_running: bool,
    pub peak: f32,
}

/// Format whole seconds as `mm:ss`
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One booth: its engine, its clock and its rental state
pub struct SessionController<C: Clock = MonotonicClock> {
    engine: AudioEngine,
    clock: C,
    config: SessionConfig,

    phase: Phase,
    door_open: bool,

    /// Set once on entering COUNTDOWN
    start_deadline: Option<Instant>,
    end_deadline: Option<Instant>,

    countdown_remaining: u64,
    remaining: u64,

    /// Clock loop exists only during COUNTDOWN and LIVE
    clock_armed: bool,
    last_level: Option<Instant>,
}

impl SessionController<MonotonicClock> {
    /// Booth on the system audio host and clock
    pub fn new(config: BoothConfig) -> Self {
        Self::with_engine(AudioEngine::with_config(config.engine), MonotonicClock, config.session)
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_engine(engine: AudioEngine, clock: C, config: SessionConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Invalid session configuration ({}), using defaults", e);
                SessionConfig::default()
            }
        };

        Self {
            countdown_remaining: ceil_seconds(config.countdown),
            remaining: ceil_seconds(config.session_duration),
            engine,
            clock,
            config,
            phase: Phase::Idle,
            door_open: false,
            start_deadline: None,
            end_deadline: None,
            clock_armed: false,
            last_level: None,
        }
    }

    /// Start the monitor and begin the countdown
    ///
    /// From IDLE or ENDED only; a coin inserted mid-session is ignored.
    /// If the engine cannot start, the phase is left as it was and the
    /// error is returned (and announced as [`Event::StartFailed`]).
    pub fn insert_coin_and_start(&mut self) -> EngineResult<()> {
        if self.phase.door_open() {
            warn!("Coin inserted during {} phase, ignoring", self.phase);
            return Ok(());
        }

        let now = self.clock.now();
        let start = now.checked_add(self.config.countdown);
        let end = start.and_then(|start| start.checked_add(self.config.session_duration));
        let (Some(start), Some(end)) = (start, end) else {
            let e = EngineError::ConfigError("session deadline out of range".into());
            self.emit(Event::StartFailed {
                message: e.to_string(),
            });
            return Err(e);
        };

        if let Err(e) = self.engine.start() {
            self.emit(Event::StartFailed {
                message: e.to_string(),
            });
            return Err(e);
        }

        // Preset first, then the user's own tweaks on top of it
        let live = *self.engine.live();
        self.engine.set_preset(live.preset());
        self.engine.set_volume(live.volume());
        self.engine.set_echo(live.echo());
        self.engine.set_room(live.room());

        self.start_deadline = Some(start);
        self.end_deadline = Some(end);
        self.countdown_remaining = ceil_seconds(self.config.countdown);
        self.remaining = ceil_seconds(self.config.session_duration);
        self.door_open = true;
        self.clock_armed = true;

        self.set_phase(Phase::Countdown);
        self.emit(Event::CountdownTick {
            seconds: self.countdown_remaining,
        });
        Ok(())
    }

    /// Advance the clock loop once
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        self.publish_level(now);

        if !self.clock_armed {
            return TickOutcome::Stopped;
        }
        debug_assert!(self.engine.is_running(), "session clock running without an engine");

        if self.phase == Phase::Countdown {
            let Some(start) = self.start_deadline else {
                return self.disarm();
            };
            if now >= start {
                self.countdown_remaining = 0;
                self.set_phase(Phase::Live);
            } else {
                self.update_countdown(seconds_until(start, now));
            }
        }

        if self.phase == Phase::Live {
            let Some(end) = self.end_deadline else {
                return self.disarm();
            };
            if now >= end {
                self.remaining = 0;
                self.emit(Event::RemainingTick { seconds: 0 });
                self.door_open = false;
                self.disarm();
                self.engine.stop();
                self.set_phase(Phase::Ended);
                info!("Session time is up");
                return TickOutcome::Stopped;
            }
            self.update_remaining(seconds_until(end, now));
        }

        TickOutcome::Continue
    }

    /// End the session early. The monitor keeps running until reset.
    pub fn stop_session(&mut self) {
        if !self.phase.door_open() {
            debug!("Stop requested in {} phase, nothing to do", self.phase);
            return;
        }

        self.door_open = false;
        self.disarm();
        self.set_phase(Phase::Ended);
        info!("Session stopped early, monitor left running");
    }

    /// Tear everything down and return to IDLE
    pub fn hard_stop_reset(&mut self) {
        self.disarm();
        self.engine.stop();
        self.door_open = false;
        self.engine.clear_mute();

        self.start_deadline = None;
        self.end_deadline = None;
        self.countdown_remaining = ceil_seconds(self.config.countdown);
        self.remaining = ceil_seconds(self.config.session_duration);
        self.last_level = None;

        self.set_phase(Phase::Idle);
    }

    /// Tick every `tick_interval` until the clock loop stops
    pub fn run_clock(&mut self) {
        while self.tick() == TickOutcome::Continue {
            thread::sleep(self.config.tick_interval);
        }
    }

    /// Dispatch a front-desk command
    pub fn apply(&mut self, command: Command) -> EngineResult<()> {
        match command {
            Command::InsertCoin => return self.insert_coin_and_start(),
            Command::StopSession => self.stop_session(),
            Command::Reset | Command::Shutdown => self.hard_stop_reset(),
            Command::SetPreset(preset) => self.set_preset(preset),
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::SetEcho(amount) => self.set_echo(amount),
            Command::SetRoom(amount) => self.set_room(amount),
            Command::ToggleMute => {
                self.toggle_mute();
            }
        }
        Ok(())
    }

    pub fn set_preset(&mut self, preset: BoothPreset) {
        self.engine.set_preset(preset);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
    }

    pub fn set_echo(&mut self, amount: f32) {
        self.engine.set_echo(amount);
    }

    pub fn set_room(&mut self, amount: f32) {
        self.engine.set_room(amount);
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.engine.toggle_mute()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }

    pub fn countdown_remaining(&self) -> u64 {
        self.countdown_remaining
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock_armed
    }

    pub fn is_muted(&self) -> bool {
        self.engine.is_muted()
    }

    pub fn volume(&self) -> f32 {
        self.engine.volume()
    }

    pub fn echo(&self) -> f32 {
        self.engine.echo()
    }

    pub fn room(&self) -> f32 {
        self.engine.room()
    }

    pub fn preset(&self) -> BoothPreset {
        self.engine.preset()
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> BoothSnapshot {
        BoothSnapshot {
            phase: self.phase,
            door_open: self.door_open,
            countdown_seconds: self.countdown_remaining,
            remaining_seconds: self.remaining,
            remaining_display: format_mm_ss(self.remaining),
            muted: self.engine.is_muted(),
            volume: self.engine.volume(),
            echo: self.engine.echo(),
            room: self.engine.room(),
            preset: self.engine.preset(),
            engine_running: self.engine.is_running(),
            peak: self.engine.peak_level(),
        }
    }

    /// Poll for events from the engine and the session (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.engine.poll_event()
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        info!("Session {} -> {}", self.phase, phase);
        self.phase = phase;
        self.emit(Event::PhaseChanged { phase });
    }

    fn disarm(&mut self) -> TickOutcome {
        self.clock_armed = false;
        TickOutcome::Stopped
    }

    fn update_countdown(&mut self, seconds: u64) {
        if seconds != self.countdown_remaining {
            self.countdown_remaining = seconds;
            self.emit(Event::CountdownTick { seconds });
        }
    }

    fn update_remaining(&mut self, seconds: u64) {
        if seconds != self.remaining {
            self.remaining = seconds;
            self.emit(Event::RemainingTick { seconds });
        }
    }

    fn publish_level(&mut self, now: Instant) {
        if !self.engine.is_running() {
            return;
        }
        let due = self
            .last_level
            .map_or(true, |last| now.saturating_duration_since(last) >= LEVEL_INTERVAL);
        if due {
            self.last_level = Some(now);
            self.emit(Event::LevelUpdate {
                peak: self.engine.peak_level(),
            });
        }
    }

    fn emit(&self, event: Event) {
        self.engine.emit(event);
    }
}

impl<C: Clock> Drop for SessionController<C> {
    fn drop(&mut self) {
        self.hard_stop_reset();
    }
}
