//! Audio Processor Trait
//!
//! Defines the interface for the serial stages of the vocal chain.
//! The dry path (high-pass -> presence -> compressor) is a `ProcessorChain`.

/// Context passed to processors; the capture path is always mono
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext {
    pub sample_rate: f32,
}

impl ProcessContext {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

/// Trait for audio processors in the DSP chain
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = buffer size
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Process a mono buffer in-place
    fn process(&mut self, buffer: &mut [f32], context: &ProcessContext);

    /// Reset internal state (filter memory, envelopes, etc.)
    fn reset(&mut self);

    /// Human-readable name for debugging
    fn name(&self) -> &'static str;
}

/// A chain of processors applied sequentially
pub struct ProcessorChain {
    processors: Vec<Box<dyn AudioProcessor>>,
    context: ProcessContext,
}

impl ProcessorChain {
    pub fn new(context: ProcessContext) -> Self {
        Self {
            processors: Vec::new(),
            context,
        }
    }

    /// Add a processor to the end of the chain
    ///
    /// Note: This allocates. Only call during graph construction, not in the audio callback.
    pub fn add<P: AudioProcessor + 'static>(&mut self, processor: P) {
        self.processors.push(Box::new(processor));
    }

    /// Process buffer through every processor in order
    #[inline]
    pub fn process(&mut self, buffer: &mut [f32]) {
        for processor in &mut self.processors {
            processor.process(buffer, &self.context);
        }
    }

    /// Reset all processors
    pub fn reset(&mut self) {
        for processor in &mut self.processors {
            processor.reset();
        }
    }

    /// Names of the processors, in processing order
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    /// Get number of processors in chain
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if chain is empty
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
