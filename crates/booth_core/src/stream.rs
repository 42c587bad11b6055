//! cpal Capture Backend
//!
//! Handles the low-level stream setup and real-time audio callbacks.
//!
//! # Audio Flow
//!
//! ```text
//! Microphone → input callback (downmix to mono) → rtrb ring buffer
//!            → output callback → MonitorGraph → fan out to every output channel
//! ```
//!
//! cpal streams are not `Send` on every host, so both streams live on a
//! dedicated `booth-capture` thread. The control thread only sees a
//! [`CpalCapture`] handle that asks that thread to drop them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig, SupportedBufferSize};
use crossbeam_channel::{bounded, Sender};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info, warn};

use crate::capture::{CaptureBackend, CaptureHandle, CaptureRequest, GraphFactory, LatencyEstimate};
use crate::device::{find_input, find_output};
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use booth_dsp::MonitorGraph;

/// Samples processed per graph call when the host hands out a huge buffer
const MAX_BLOCK: usize = 4096;

/// Output latency not reported yet
const LATENCY_UNKNOWN: u32 = u32::MAX;

/// Blocks of capture the monitor may lag behind before the excess is dropped
const MAX_BACKLOG_BLOCKS: usize = 2;

/// Samples to discard so that at most `MAX_BACKLOG_BLOCKS` blocks stay queued
///
/// Covers the head start the capture stream gets before the monitor starts
/// pulling, and any clock drift between the two devices.
#[inline]
fn backlog_excess(queued: usize, frames: usize) -> usize {
    if frames == 0 {
        return 0;
    }
    queued.saturating_sub(frames * MAX_BACKLOG_BLOCKS)
}

/// Opens the microphone and monitor output through cpal
#[derive(Debug, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn open(
        &mut self,
        request: &CaptureRequest,
        graph: GraphFactory,
        events: Sender<Event>,
    ) -> EngineResult<Box<dyn CaptureHandle>> {
        if cpal::available_hosts().is_empty() {
            return Err(EngineError::UnsupportedPlatform(
                "no audio host available".into(),
            ));
        }

        let (reply_tx, reply_rx) = bounded::<EngineResult<Negotiated>>(1);
        let (close_tx, close_rx) = bounded::<()>(1);
        let request = request.clone();

        let thread = thread::Builder::new()
            .name("booth-capture".into())
            .spawn(move || {
                let streams = match open_streams(&request, graph, events) {
                    Ok((streams, negotiated)) => {
                        if reply_tx.send(Ok(negotiated)).is_err() {
                            return;
                        }
                        streams
                    }
                    Err(e) => {
                        let _ = reply_tx.send(Err(e));
                        return;
                    }
                };

                // Park until the engine closes us (or drops the handle)
                let _ = close_rx.recv();
                drop(streams);
                debug!("Capture streams released");
            })
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        match reply_rx.recv() {
            Ok(Ok(negotiated)) => Ok(Box::new(CpalCapture {
                negotiated,
                close_tx,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(EngineError::CaptureThreadLost)
            }
        }
    }
}

/// Stream facts decided while opening
#[derive(Debug, Clone)]
struct Negotiated {
    sample_rate: u32,
    buffer_frames: Option<u32>,
    output_latency_micros: Arc<AtomicU32>,
}

/// Keeps the capture thread (and with it both streams) alive
pub struct CpalCapture {
    negotiated: Negotiated,
    close_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl CpalCapture {
    fn shutdown(&mut self) -> EngineResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.close_tx.send(());
        thread.join().map_err(|_| EngineError::CaptureThreadLost)
    }
}

impl CaptureHandle for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.negotiated.sample_rate
    }

    fn latency(&self) -> LatencyEstimate {
        let rate = self.negotiated.sample_rate as f64;
        let micros = self.negotiated.output_latency_micros.load(Ordering::Relaxed);
        LatencyEstimate {
            sample_rate: self.negotiated.sample_rate,
            base_latency: self.negotiated.buffer_frames.map(|f| f as f64 / rate),
            output_latency: (micros != LATENCY_UNKNOWN).then(|| micros as f64 / 1_000_000.0),
        }
    }

    fn close(mut self: Box<Self>) -> EngineResult<()> {
        self.shutdown()
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Capture thread did not shut down cleanly: {}", e);
        }
    }
}

/// Runs on the capture thread. Any error drops everything built so far.
fn open_streams(
    request: &CaptureRequest,
    graph: GraphFactory,
    events: Sender<Event>,
) -> EngineResult<((Stream, Stream), Negotiated)> {
    let host = cpal::default_host();
    info!("Using audio host: {:?}", host.id());

    let input = find_input(&host, request.input_device.as_deref())?;
    let output = find_output(&host, request.output_device.as_deref())?;
    info!(
        "Microphone: {}, monitor output: {}",
        input.name().unwrap_or_else(|_| "<unnamed>".into()),
        output.name().unwrap_or_else(|_| "<unnamed>".into()),
    );

    // cpal has no switch for platform voice processing; the request is recorded only
    debug!("Capture constraints: {:?}", request.constraints);

    let input_default = input
        .default_input_config()
        .map_err(|e| EngineError::CaptureDevice(e.to_string()))?;

    let sample_rate = match request.sample_rate {
        Some(rate) => {
            let supported = input
                .supported_input_configs()
                .map_err(|e| EngineError::CaptureDevice(e.to_string()))?
                .any(|c| c.min_sample_rate().0 <= rate && rate <= c.max_sample_rate().0);
            if !supported {
                return Err(EngineError::CaptureDevice(format!(
                    "microphone does not support {} Hz",
                    rate
                )));
            }
            rate
        }
        None => input_default.sample_rate().0,
    };

    let mono = input
        .supported_input_configs()
        .map(|mut configs| {
            configs.any(|c| {
                c.channels() == 1
                    && c.min_sample_rate().0 <= sample_rate
                    && sample_rate <= c.max_sample_rate().0
            })
        })
        .unwrap_or(false);
    let input_channels = if mono { 1 } else { input_default.channels().max(1) };

    let output_channels = output
        .default_output_config()
        .map_err(|e| EngineError::StreamBuildError(e.to_string()))?
        .channels()
        .max(1);

    let buffer_frames = request
        .latency_hint
        .buffer_frames(sample_rate)
        .map(|frames| clamp_buffer(frames, input_default.buffer_size()));
    let buffer_size = buffer_frames.map_or(BufferSize::Default, BufferSize::Fixed);

    info!(
        "Stream format: {} Hz, {} input ch ({}), {} output ch, buffer {:?}",
        sample_rate,
        input_channels,
        if mono { "mono" } else { "downmixed" },
        output_channels,
        buffer_frames,
    );

    let monitor = graph(sample_rate)?;

    let ring_size = (buffer_frames.unwrap_or(1024) as usize * 8).max(MAX_BLOCK);
    let (producer, consumer) = RingBuffer::<f32>::new(ring_size);
    let output_latency_micros = Arc::new(AtomicU32::new(LATENCY_UNKNOWN));

    let input_config = StreamConfig {
        channels: input_channels,
        sample_rate: SampleRate(sample_rate),
        buffer_size,
    };
    let output_config = StreamConfig {
        channels: output_channels,
        sample_rate: SampleRate(sample_rate),
        buffer_size,
    };

    let capture_stream = build_capture_stream(&input, &input_config, producer, events.clone())?;
    let monitor_stream = build_monitor_stream(
        &output,
        &output_config,
        consumer,
        monitor,
        Arc::clone(&output_latency_micros),
        events,
    )?;

    capture_stream
        .play()
        .map_err(|e| EngineError::CaptureDevice(e.to_string()))?;
    monitor_stream
        .play()
        .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

    Ok((
        (capture_stream, monitor_stream),
        Negotiated {
            sample_rate,
            buffer_frames,
            output_latency_micros,
        },
    ))
}

fn clamp_buffer(frames: u32, supported: &SupportedBufferSize) -> u32 {
    match *supported {
        SupportedBufferSize::Range { min, max } => frames.clamp(min, max),
        SupportedBufferSize::Unknown => frames,
    }
}

fn build_capture_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: Producer<f32>,
    event_sender: Sender<Event>,
) -> EngineResult<Stream> {
    let err_sender = event_sender.clone();
    let channels = config.channels as usize;
    let mut overrun = false;

    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Real-time audio callback - NO allocations allowed here
                let frames = data.len() / channels;
                let writable = frames.min(producer.slots());

                if let Ok(chunk) = producer.write_chunk_uninit(writable) {
                    chunk.fill_from_iter(
                        data.chunks_exact(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                    );
                }

                // Report once per overrun episode
                if writable < frames {
                    if !overrun {
                        overrun = true;
                        let _ = event_sender.try_send(Event::BufferOverrun);
                    }
                } else {
                    overrun = false;
                }
            },
            move |err| {
                let _ = err_sender.try_send(Event::stream_error(err));
            },
            None,
        )
        .map_err(|e| EngineError::CaptureDevice(e.to_string()))
}

fn build_monitor_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: Consumer<f32>,
    mut graph: MonitorGraph,
    output_latency_micros: Arc<AtomicU32>,
    event_sender: Sender<Event>,
) -> EngineResult<Stream> {
    let err_sender = event_sender.clone();
    let channels = config.channels as usize;
    let mut scratch = vec![0.0_f32; MAX_BLOCK];
    let mut starved = false;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], info: &cpal::OutputCallbackInfo| {
                // Real-time audio callback - NO allocations allowed here
                let timestamp = info.timestamp();
                if let Some(latency) = timestamp.playback.duration_since(&timestamp.callback) {
                    let micros = latency.as_micros().min(LATENCY_UNKNOWN as u128 - 1) as u32;
                    output_latency_micros.store(micros, Ordering::Relaxed);
                }

                for out in data.chunks_mut(MAX_BLOCK * channels) {
                    let frames = out.len() / channels;
                    let block = &mut scratch[..frames];

                    let excess = backlog_excess(consumer.slots(), frames);
                    if excess > 0 {
                        if let Ok(stale) = consumer.read_chunk(excess) {
                            stale.commit_all();
                        }
                    }

                    let available = frames.min(consumer.slots());
                    if let Ok(chunk) = consumer.read_chunk(available) {
                        let (first, second) = chunk.as_slices();
                        block[..first.len()].copy_from_slice(first);
                        block[first.len()..first.len() + second.len()].copy_from_slice(second);
                        chunk.commit_all();
                    }
                    block[available..].fill(0.0);

                    // Report once per starvation episode
                    if available < frames {
                        if !starved {
                            starved = true;
                            let _ = event_sender.try_send(Event::BufferUnderrun);
                        }
                    } else {
                        starved = false;
                    }

                    graph.process(block);

                    for (frame, &sample) in out.chunks_mut(channels).zip(block.iter()) {
                        frame.fill(sample);
                    }
                }
            },
            move |err| {
                let _ = err_sender.try_send(Event::stream_error(err));
            },
            None,
        )
        .map_err(|e| EngineError::StreamBuildError(e.to_string()))
}
