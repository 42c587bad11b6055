//! Delay Line
//!
//! Fixed-capacity circular buffer used by the echo and room sends.
//! Capacity is allocated once at graph construction; reads and writes
//! are allocation-free.

use crate::error::DspError;

pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    sample_rate: f32,
}

impl DelayLine {
    /// Create a delay line able to hold up to `max_seconds` of audio
    pub fn new(max_seconds: f32, sample_rate: f32) -> Result<Self, DspError> {
        if sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        let capacity = (max_seconds * sample_rate).ceil().max(1.0) as usize + 1;
        Ok(Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay_samples: 1,
            sample_rate,
        })
    }

    /// Create a line sized for, and set to, `max_seconds` / `seconds`
    pub fn with_delay(seconds: f32, max_seconds: f32, sample_rate: f32) -> Result<Self, DspError> {
        let mut line = Self::new(max_seconds, sample_rate)?;
        line.set_delay(seconds)?;
        Ok(line)
    }

    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 1) as f32 / self.sample_rate
    }

    /// Set the delay time. Values shorter than one sample are rounded up to one.
    pub fn set_delay(&mut self, seconds: f32) -> Result<(), DspError> {
        let samples = (seconds * self.sample_rate).round() as usize;
        if samples >= self.buffer.len() {
            return Err(DspError::DelayTooLong {
                seconds,
                max_seconds: self.max_delay(),
            });
        }
        self.delay_samples = samples.max(1);
        Ok(())
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Sample written `delay_samples` writes ago
    #[inline]
    pub fn read(&self) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write_pos + len - self.delay_samples) % len]
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_arrives_after_delay() {
        let mut line = DelayLine::with_delay(0.001, 0.01, 48000.0).unwrap();
        assert_eq!(line.delay_samples(), 48);

        let mut outputs = Vec::new();
        for i in 0..100 {
            outputs.push(line.read());
            line.write(if i == 0 { 1.0 } else { 0.0 });
        }

        assert_eq!(outputs[48], 1.0);
        assert_eq!(outputs.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn test_delay_beyond_capacity_rejected() {
        let mut line = DelayLine::new(0.2, 48000.0).unwrap();
        assert!(line.set_delay(0.02).is_ok());
        assert!(matches!(
            line.set_delay(0.5),
            Err(DspError::DelayTooLong { .. })
        ));
        // Failed update keeps the previous delay
        assert_eq!(line.delay_samples(), 960);
    }

    #[test]
    fn test_capacity_holds_max_delay() {
        let mut line = DelayLine::new(1.0, 48000.0).unwrap();
        assert!(line.set_delay(1.0).is_ok());
        assert!(line.max_delay() >= 1.0);
    }

    #[test]
    fn test_reset_silences_line() {
        let mut line = DelayLine::with_delay(0.0001, 0.001, 48000.0).unwrap();
        for _ in 0..10 {
            line.write(0.7);
        }
        line.reset();
        for _ in 0..10 {
            assert_eq!(line.read(), 0.0);
            line.write(0.0);
        }
    }

    #[test]
    fn test_invalid_sample_rate() {
        assert!(DelayLine::new(1.0, 0.0).is_err());
    }
}
