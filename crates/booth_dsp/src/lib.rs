//! Booth DSP - Digital Signal Processing for the Karaoke Booth
//!
//! This crate provides the vocal monitoring chain, including:
//! - High-pass and presence BiQuad filters
//! - Soft-knee dynamics compressor
//! - Echo (feedback delay) and room (single reflection) sends
//! - Lock-free parameter block shared with the audio callback
//! - The fixed monitor graph and booth presets
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Stages are allocated once when the graph is built; gains are updated
//! atomically between buffer processing calls.

mod compressor;
mod delay;
mod error;
mod filter;
mod graph;
mod params;
mod presets;
mod processor;

pub use compressor::{Compressor, CompressorSettings};
pub use delay::DelayLine;
pub use error::DspError;
pub use filter::{Filter, FilterKind, FilterSpec, HIGH_PASS, PRESENCE};
pub use graph::{Connection, MonitorGraph, SendSettings, Stage, STAGES, TOPOLOGY};
pub use params::{LiveParameters, MonitorParams, ECHO_SEND_SCALE, MAX_VOLUME, ROOM_SEND_SCALE};
pub use presets::{BoothPreset, PresetLevels, PRESETS};
pub use processor::{AudioProcessor, ProcessContext, ProcessorChain};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let params = Arc::new(MonitorParams::new());
        let _graph = MonitorGraph::build(48000.0, params).unwrap();
        let _live = LiveParameters::default();
    }
}
