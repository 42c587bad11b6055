//! Live Monitor Parameters
//!
//! Two halves:
//! - [`MonitorParams`]: lock-free scalars read by the audio callback
//! - [`LiveParameters`]: the user's intent (volume, sends, mute) kept on the
//!   control thread; survives graph rebuilds and is written into
//!   `MonitorParams` whenever it changes.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::presets::BoothPreset;

/// Upper bound for the monitor volume
pub const MAX_VOLUME: f32 = 2.0;

/// Echo send at full amount, relative to unity
pub const ECHO_SEND_SCALE: f32 = 0.25;

/// Room send at full amount, relative to unity
pub const ROOM_SEND_SCALE: f32 = 0.12;

/// Gains shared between control thread and audio callback
///
/// Rust pattern: AtomicF32 doesn't exist, so values are stored as f32 bits.
/// Relaxed ordering is fine: each value is an independent scalar.
pub struct MonitorParams {
    output_gain_bits: AtomicU32,
    echo_send_bits: AtomicU32,
    room_send_bits: AtomicU32,
    /// Output peak of the most recent block (for meters)
    peak_bits: AtomicU32,
}

impl MonitorParams {
    pub fn new() -> Self {
        Self {
            output_gain_bits: AtomicU32::new(1.0_f32.to_bits()),
            echo_send_bits: AtomicU32::new(0.0_f32.to_bits()),
            room_send_bits: AtomicU32::new(0.0_f32.to_bits()),
            peak_bits: AtomicU32::new(0.0_f32.to_bits()),
        }
    }

    pub fn set_output_gain(&self, gain: f32) {
        self.output_gain_bits.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn output_gain(&self) -> f32 {
        f32::from_bits(self.output_gain_bits.load(Ordering::Relaxed))
    }

    pub fn set_echo_send(&self, gain: f32) {
        self.echo_send_bits.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn echo_send(&self) -> f32 {
        f32::from_bits(self.echo_send_bits.load(Ordering::Relaxed))
    }

    pub fn set_room_send(&self, gain: f32) {
        self.room_send_bits.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn room_send(&self) -> f32 {
        f32::from_bits(self.room_send_bits.load(Ordering::Relaxed))
    }

    pub fn set_peak(&self, peak: f32) {
        self.peak_bits.store(peak.to_bits(), Ordering::Relaxed);
    }

    pub fn peak(&self) -> f32 {
        f32::from_bits(self.peak_bits.load(Ordering::Relaxed))
    }
}

impl Default for MonitorParams {
    fn default() -> Self {
        Self::new()
    }
}

/// The user's monitor settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveParameters {
    /// Last volume passed to `set_volume`, clamped. Muting never touches it.
    volume: f32,
    echo: f32,
    room: f32,
    muted: bool,
    preset: BoothPreset,
}

impl Default for LiveParameters {
    /// Booth opens on the ECHO preset
    fn default() -> Self {
        let mut live = Self {
            volume: 1.0,
            echo: 0.0,
            room: 0.0,
            muted: false,
            preset: BoothPreset::Echo,
        };
        live.set_preset(BoothPreset::Echo);
        live
    }
}

impl LiveParameters {
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_finite(volume, 0.0, MAX_VOLUME);
    }

    pub fn set_echo(&mut self, amount: f32) {
        self.echo = clamp_finite(amount, 0.0, 1.0);
    }

    pub fn set_room(&mut self, amount: f32) {
        self.room = clamp_finite(amount, 0.0, 1.0);
    }

    pub fn set_preset(&mut self, preset: BoothPreset) {
        let levels = preset.levels();
        self.set_echo(levels.echo);
        self.set_room(levels.room);
        self.set_volume(levels.volume);
        self.preset = preset;
    }

    /// Flip mute, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn echo(&self) -> f32 {
        self.echo
    }

    pub fn room(&self) -> f32 {
        self.room
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn preset(&self) -> BoothPreset {
        self.preset
    }

    /// Gain actually applied at the output stage
    pub fn output_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn echo_send(&self) -> f32 {
        self.echo * ECHO_SEND_SCALE
    }

    pub fn room_send(&self) -> f32 {
        self.room * ROOM_SEND_SCALE
    }

    /// Write every gain into the shared block
    pub fn apply_to(&self, params: &MonitorParams) {
        params.set_output_gain(self.output_gain());
        params.set_echo_send(self.echo_send());
        params.set_room_send(self.room_send());
    }
}

/// Clamp, mapping NaN to the lower bound
#[inline]
fn clamp_finite(value: f32, lo: f32, hi: f32) -> f32 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_params_defaults() {
        let params = MonitorParams::new();
        assert_eq!(params.output_gain(), 1.0);
        assert_eq!(params.echo_send(), 0.0);
        assert_eq!(params.room_send(), 0.0);
        assert_eq!(params.peak(), 0.0);
    }

    #[test]
    fn test_default_is_echo_preset() {
        let live = LiveParameters::default();
        assert_eq!(live.preset(), BoothPreset::Echo);
        assert_eq!(live.echo(), 0.65);
        assert_eq!(live.room(), 0.12);
        assert_eq!(live.volume(), 1.08);
        assert!(!live.is_muted());
    }

    #[test]
    fn test_volume_clamped() {
        let mut live = LiveParameters::default();
        for (input, expected) in [(-1.0, 0.0), (0.0, 0.0), (1.3, 1.3), (2.0, 2.0), (7.5, 2.0)] {
            live.set_volume(input);
            assert_eq!(live.volume(), expected);
        }
        live.set_volume(f32::NAN);
        assert_eq!(live.volume(), 0.0);
        live.set_volume(f32::INFINITY);
        assert_eq!(live.volume(), 2.0);
    }

    #[test]
    fn test_sends_clamped_and_scaled() {
        let mut live = LiveParameters::default();

        live.set_echo(1.7);
        assert_eq!(live.echo(), 1.0);
        assert_eq!(live.echo_send(), 0.25);

        live.set_echo(-3.0);
        assert_eq!(live.echo_send(), 0.0);

        live.set_room(0.5);
        assert_eq!(live.room_send(), 0.5 * 0.12);

        live.set_room(12.0);
        assert_eq!(live.room_send(), 0.12);
    }

    #[test]
    fn test_mute_keeps_volume() {
        let mut live = LiveParameters::default();
        live.set_volume(1.4);

        assert!(live.toggle_mute());
        assert_eq!(live.output_gain(), 0.0);
        assert_eq!(live.volume(), 1.4);

        assert!(!live.toggle_mute());
        assert!(live.toggle_mute());
        assert!(!live.toggle_mute());
        assert_eq!(live.output_gain(), 1.4);
    }

    #[test]
    fn test_volume_change_while_muted_is_remembered() {
        let mut live = LiveParameters::default();
        live.toggle_mute();
        live.set_volume(0.4);
        assert_eq!(live.output_gain(), 0.0);
        live.toggle_mute();
        assert_eq!(live.output_gain(), 0.4);
    }

    #[test]
    fn test_apply_to_shared_block() {
        let params = MonitorParams::new();
        let mut live = LiveParameters::default();
        live.set_preset(BoothPreset::Stage);
        live.apply_to(&params);

        assert_eq!(params.output_gain(), 1.15);
        assert_eq!(params.echo_send(), 0.25);
        assert_eq!(params.room_send(), 0.35 * 0.12);

        live.toggle_mute();
        live.apply_to(&params);
        assert_eq!(params.output_gain(), 0.0);
    }
}
