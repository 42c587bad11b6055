//! Dynamics Compressor
//!
//! Feed-forward, soft-knee compressor that tames vocal peaks before the
//! output gain stage.
//!
//! # Algorithm
//!
//! - Detector: instantaneous level in dB
//! - Gain computer: quadratic soft knee around the threshold
//! - Smoothing: one-pole attack/release on the gain reduction (in dB)

use crate::processor::{AudioProcessor, ProcessContext};

/// Floor used when converting silence to dB
const MIN_LEVEL_DB: f32 = -120.0;

/// Compressor parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    /// Attack time in seconds
    pub attack: f32,
    /// Release time in seconds
    pub release: f32,
}

impl Default for CompressorSettings {
    /// Gentle vocal setting: tames peaks without audible pumping
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            knee_db: 12.0,
            ratio: 3.0,
            attack: 0.003,
            release: 0.18,
        }
    }
}

impl CompressorSettings {
    /// Static curve: output level (dB) for an input level (dB)
    pub fn gain_computer(&self, input_db: f32) -> f32 {
        let over = input_db - self.threshold_db;
        let ratio = self.ratio.max(1.0);

        if self.knee_db > 0.0 && (2.0 * over).abs() <= self.knee_db {
            let x = over + self.knee_db / 2.0;
            input_db + (1.0 / ratio - 1.0) * x * x / (2.0 * self.knee_db)
        } else if 2.0 * over > self.knee_db {
            self.threshold_db + over / ratio
        } else {
            input_db
        }
    }
}

/// Convert a time constant to a one-pole smoothing coefficient
#[inline]
fn time_coefficient(seconds: f32, sample_rate: f32) -> f32 {
    if seconds <= 0.0 {
        0.0
    } else {
        (-1.0 / (seconds * sample_rate)).exp()
    }
}

#[inline]
fn linear_to_db(value: f32) -> f32 {
    if value <= 0.0 {
        MIN_LEVEL_DB
    } else {
        (20.0 * value.log10()).max(MIN_LEVEL_DB)
    }
}

#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub struct Compressor {
    settings: CompressorSettings,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed gain reduction in dB (always <= 0)
    envelope_db: f32,
}

impl Compressor {
    pub fn new(settings: CompressorSettings, sample_rate: f32) -> Self {
        Self {
            settings,
            attack_coeff: time_coefficient(settings.attack, sample_rate),
            release_coeff: time_coefficient(settings.release, sample_rate),
            envelope_db: 0.0,
        }
    }

    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Current gain reduction in dB (0 = no compression)
    pub fn gain_reduction_db(&self) -> f32 {
        self.envelope_db
    }

    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        let level_db = linear_to_db(sample.abs());
        let target = self.settings.gain_computer(level_db) - level_db;

        // More reduction than we have = attack, less = release
        let coeff = if target < self.envelope_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope_db = coeff * self.envelope_db + (1.0 - coeff) * target;

        sample * db_to_linear(self.envelope_db)
    }
}

impl AudioProcessor for Compressor {
    fn process(&mut self, buffer: &mut [f32], _context: &ProcessContext) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    fn reset(&mut self) {
        self.envelope_db = 0.0;
    }

    fn name(&self) -> &'static str {
        "Compressor"
    }
}
