//! Vocal EQ Filters
//!
//! Two fixed BiQuad stages shape the microphone before compression:
//! a high-pass that removes rumble and handling noise, and a gentle
//! presence peak for clarity. Coefficients follow the RBJ Audio EQ Cookbook.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F32};

use crate::error::DspError;
use crate::processor::{AudioProcessor, ProcessContext};

/// Response shape of a filter stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    HighPass,
    Peaking { gain_db: f32 },
}

/// Static description of a filter stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub frequency: f32,
    pub q: f32,
}

/// Removes content below 85 Hz
pub const HIGH_PASS: FilterSpec = FilterSpec {
    kind: FilterKind::HighPass,
    frequency: 85.0,
    q: Q_BUTTERWORTH_F32,
};

/// +2.5 dB around 2.8 kHz
pub const PRESENCE: FilterSpec = FilterSpec {
    kind: FilterKind::Peaking { gain_db: 2.5 },
    frequency: 2800.0,
    q: 0.9,
};

impl FilterSpec {
    /// Generate BiQuad coefficients for this stage
    fn to_coefficients(self, sample_rate: f32) -> Result<Coefficients<f32>, DspError> {
        if sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }

        let filter_type = match self.kind {
            FilterKind::HighPass => Type::HighPass,
            FilterKind::Peaking { gain_db } => Type::PeakingEQ(gain_db),
        };

        Coefficients::<f32>::from_params(filter_type, sample_rate.hz(), self.frequency.hz(), self.q)
            .map_err(|_| DspError::InvalidCoefficients {
                frequency: self.frequency,
                sample_rate,
            })
    }
}

/// A single mono BiQuad stage
pub struct Filter {
    // DirectForm2Transposed: better numerical stability than DF1
    biquad: DirectForm2Transposed<f32>,
    spec: FilterSpec,
    name: &'static str,
}

impl Filter {
    pub fn new(name: &'static str, spec: FilterSpec, sample_rate: f32) -> Result<Self, DspError> {
        let coeffs = spec.to_coefficients(sample_rate)?;
        Ok(Self {
            biquad: DirectForm2Transposed::<f32>::new(coeffs),
            spec,
            name,
        })
    }

    pub fn high_pass(sample_rate: f32) -> Result<Self, DspError> {
        Self::new("High-Pass 85Hz", HIGH_PASS, sample_rate)
    }

    pub fn presence(sample_rate: f32) -> Result<Self, DspError> {
        Self::new("Presence 2.8kHz", PRESENCE, sample_rate)
    }

    pub fn spec(&self) -> FilterSpec {
        self.spec
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        self.biquad.run(sample)
    }
}

impl AudioProcessor for Filter {
    fn process(&mut self, buffer: &mut [f32], _context: &ProcessContext) {
        for sample in buffer.iter_mut() {
            *sample = self.biquad.run(*sample);
        }
    }

    fn reset(&mut self) {
        self.biquad.reset_state();
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_peak(filter: &mut Filter, freq: f32, sample_rate: f32) -> f32 {
        let mut peak = 0.0_f32;
        for i in 0..(sample_rate as usize / 2) {
            let t = i as f32 / sample_rate;
            let out = filter.process_sample((2.0 * std::f32::consts::PI * freq * t).sin() * 0.5);
            // Skip the transient
            if i > sample_rate as usize / 4 {
                peak = peak.max(out.abs());
            }
        }
        peak
    }

    #[test]
    fn test_high_pass_blocks_dc() {
        let mut hp = Filter::high_pass(48000.0).unwrap();
        let mut out = 0.0;
        for _ in 0..48000 {
            out = hp.process_sample(0.5);
        }
        assert!(out.abs() < 0.001, "DC should be removed, got {}", out);
    }

    #[test]
    fn test_high_pass_attenuates_rumble() {
        let mut hp = Filter::high_pass(48000.0).unwrap();
        let rumble = sine_peak(&mut hp, 30.0, 48000.0);

        let mut hp = Filter::high_pass(48000.0).unwrap();
        let voice = sine_peak(&mut hp, 440.0, 48000.0);

        assert!(rumble < voice * 0.5, "rumble {} voice {}", rumble, voice);
    }

    #[test]
    fn test_presence_boosts_center() {
        let mut presence = Filter::presence(48000.0).unwrap();
        let peak = sine_peak(&mut presence, 2800.0, 48000.0);

        // +2.5 dB is about 1.33x
        assert!(peak > 0.5 * 1.25, "peak {}", peak);
        assert!(peak < 0.5 * 1.40, "peak {}", peak);
    }

    #[test]
    fn test_invalid_sample_rate() {
        assert!(matches!(
            Filter::high_pass(0.0),
            Err(DspError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_presence_above_nyquist_rejected() {
        // 2.8 kHz is above Nyquist at 4 kHz
        assert!(matches!(
            Filter::presence(4000.0),
            Err(DspError::InvalidCoefficients { .. })
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut hp = Filter::high_pass(48000.0).unwrap();
        for _ in 0..100 {
            hp.process_sample(0.9);
        }
        AudioProcessor::reset(&mut hp);
        let mut fresh = Filter::high_pass(48000.0).unwrap();
        assert_eq!(hp.process_sample(0.3), fresh.process_sample(0.3));
    }
}
