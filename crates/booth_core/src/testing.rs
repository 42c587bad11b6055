//! In-memory capture backend for unit tests
//!
//! Records every open/close, can refuse to open, and keeps the built graph
//! reachable so tests can push samples through it.

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::Sender;

use crate::capture::{CaptureBackend, CaptureHandle, CaptureRequest, GraphFactory, LatencyEstimate};
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use booth_dsp::MonitorGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    PermissionDenied,
    NoMicrophone,
    NoAudioRuntime,
    /// The monitor output refused the requested format
    OutputUnavailable,
}

impl MockFailure {
    fn into_error(self) -> EngineError {
        match self {
            MockFailure::PermissionDenied => EngineError::CaptureDevice("permission denied".into()),
            MockFailure::NoMicrophone => EngineError::CaptureDevice("no microphone".into()),
            MockFailure::NoAudioRuntime => EngineError::UnsupportedPlatform("no audio runtime".into()),
            MockFailure::OutputUnavailable => {
                EngineError::StreamBuildError("output rejected the format".into())
            }
        }
    }
}

#[derive(Default)]
struct MockState {
    opens: usize,
    closes: usize,
    failure: Option<MockFailure>,
    fail_close: bool,
    last_request: Option<CaptureRequest>,
    graph: Option<MonitorGraph>,
}

/// Clones share state: hand one to the engine, keep one to inspect
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    sample_rate: u32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_sample_rate(48000)
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            sample_rate,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Make every following `open` fail (or succeed again with `None`)
    pub fn set_failure(&self, failure: Option<MockFailure>) {
        self.state().failure = failure;
    }

    /// Make `close` report an error after releasing everything
    pub fn set_fail_close(&self, fail: bool) {
        self.state().fail_close = fail;
    }

    pub fn opens(&self) -> usize {
        self.state().opens
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn last_request(&self) -> Option<CaptureRequest> {
        self.state().last_request.clone()
    }

    pub fn has_graph(&self) -> bool {
        self.state().graph.is_some()
    }

    /// Run `buffer` through the live graph. Returns false when there is none.
    pub fn process(&self, buffer: &mut [f32]) -> bool {
        match self.state().graph.as_mut() {
            Some(graph) => {
                graph.process(buffer);
                true
            }
            None => false,
        }
    }
}

impl CaptureBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn open(
        &mut self,
        request: &CaptureRequest,
        graph: GraphFactory,
        _events: Sender<Event>,
    ) -> EngineResult<Box<dyn CaptureHandle>> {
        let mut state = self.state();
        state.last_request = Some(request.clone());
        if let Some(failure) = state.failure {
            return Err(failure.into_error());
        }

        let rate = request.sample_rate.unwrap_or(self.sample_rate);
        state.graph = Some(graph(rate)?);
        state.opens += 1;

        Ok(Box::new(MockHandle {
            state: Arc::clone(&self.state),
            sample_rate: rate,
        }))
    }
}

struct MockHandle {
    state: Arc<Mutex<MockState>>,
    sample_rate: u32,
}

impl CaptureHandle for MockHandle {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn latency(&self) -> LatencyEstimate {
        LatencyEstimate {
            sample_rate: self.sample_rate,
            base_latency: Some(0.01),
            output_latency: None,
        }
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        state.graph = None;
        state.closes += 1;
        if state.fail_close {
            return Err(EngineError::StreamBuildError("mock teardown failed".into()));
        }
        Ok(())
    }
}
