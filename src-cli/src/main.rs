//! booth - terminal front desk for one karaoke booth
//!
//! Subcommands:
//! - `booth run` - open the booth and take commands from stdin (default)
//! - `booth devices` - list microphones and outputs

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use booth_core::{
    AudioDevice, BoothConfig, Command, EngineConfig, Event, LatencyHint, SessionConfig,
    SessionController,
};
use clap::{Args, Parser, Subcommand};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{parse_line, Input, HELP};

#[derive(Parser)]
#[command(name = "booth")]
#[command(about = "Virtual karaoke booth: live vocal monitoring on a timed session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the booth and read front-desk commands from stdin
    Run(RunArgs),

    /// List audio devices
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Monitor through speakers (enables echo cancellation, noise suppression, auto gain)
    #[arg(long)]
    speaker_mode: bool,

    /// interactive | balanced | playback | <seconds>
    #[arg(long, value_parser = parse_latency)]
    latency: Option<LatencyHint>,

    /// Force the processing sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Microphone name (see `booth devices`)
    #[arg(long)]
    input: Option<String>,

    /// Output device name
    #[arg(long)]
    output: Option<String>,

    /// Session length in seconds
    #[arg(long, default_value = "210")]
    duration: u64,

    /// Countdown length in seconds
    #[arg(long, default_value = "3")]
    countdown: u64,

    /// Insert a coin right away
    #[arg(long)]
    coin: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Print level meter updates
    #[arg(long)]
    meter: bool,
}

impl RunArgs {
    fn booth_config(&self) -> BoothConfig {
        let defaults = EngineConfig::default();
        BoothConfig {
            engine: EngineConfig {
                prefer_headphone_mode: !self.speaker_mode,
                latency_hint: self.latency.unwrap_or(defaults.latency_hint),
                forced_sample_rate: self.sample_rate,
                input_device: self.input.clone(),
                output_device: self.output.clone(),
            },
            session: SessionConfig {
                session_duration: Duration::from_secs(self.duration),
                countdown: Duration::from_secs(self.countdown),
                ..SessionConfig::default()
            },
        }
    }
}

fn parse_latency(value: &str) -> Result<LatencyHint, String> {
    match value.to_ascii_lowercase().as_str() {
        "interactive" => Ok(LatencyHint::Interactive),
        "balanced" => Ok(LatencyHint::Balanced),
        "playback" => Ok(LatencyHint::Playback),
        other => other
            .parse::<f32>()
            .map(LatencyHint::Seconds)
            .map_err(|_| format!("'{}' is not a latency hint", value)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("booth_core=info,booth_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Devices { json }) => list_devices(json),
        Some(Commands::Run(args)) => run(args),
        None => run(RunArgs {
            duration: 210,
            countdown: 3,
            ..RunArgs::default()
        }),
    }
}

fn list_devices(json: bool) -> Result<()> {
    let devices = AudioDevice::enumerate_all().context("Failed to enumerate audio devices")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    for device in devices {
        println!(
            "{:?}{} {} (rates: {:?}, mono: {})",
            device.device_type,
            if device.is_default { " [default]" } else { "" },
            device.name,
            device.sample_rates,
            device.supports_mono,
        );
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let config = args.booth_config();
    let tick = config.session.tick_interval;
    let mut booth = SessionController::new(config);
    info!("Booth open. Type 'help' for commands.");

    if args.coin {
        booth
            .insert_coin_and_start()
            .context("Could not start the booth")?;
    }

    let lines = spawn_stdin_reader()?;
    let mut stdin_open = true;

    loop {
        if stdin_open {
            match lines.recv_timeout(tick) {
                Ok(line) => match parse_line(&line) {
                    Ok(Input::Command(Command::Shutdown)) => {
                        booth.apply(Command::Shutdown)?;
                        drain_events(&booth, &args);
                        break;
                    }
                    Ok(Input::Command(command)) => {
                        if let Err(e) = booth.apply(command) {
                            eprintln!("error: {}", e);
                        }
                    }
                    Ok(Input::Status) => print_status(&booth, args.json)?,
                    Ok(Input::Help) => println!("{}", HELP),
                    Ok(Input::Empty) => {}
                    Err(message) => eprintln!("{}", message),
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("stdin closed, finishing the current session");
                    stdin_open = false;
                }
            }
        } else {
            if !booth.is_clock_running() {
                booth.hard_stop_reset();
                drain_events(&booth, &args);
                break;
            }
            thread::sleep(tick);
        }

        booth.tick();
        drain_events(&booth, &args);
    }

    Ok(())
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (sender, receiver) = unbounded();
    thread::Builder::new()
        .name("booth-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(receiver)
}

fn drain_events(booth: &SessionController, args: &RunArgs) {
    while let Some(event) = booth.poll_event() {
        if matches!(event, Event::LevelUpdate { .. }) && !args.meter {
            continue;
        }
        if args.json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize event: {}", e),
            }
        } else {
            println!("{}", describe(&event));
        }
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::PhaseChanged { phase } => format!("== {} ==", phase),
        Event::CountdownTick { seconds } => format!("starting in {}...", seconds),
        Event::RemainingTick { seconds } => {
            format!("{} left", booth_core::format_mm_ss(*seconds))
        }
        Event::EngineStarted { sample_rate } => format!("monitor on ({} Hz)", sample_rate),
        Event::EngineStopped => "monitor off".to_string(),
        Event::StartFailed { message } => format!("could not start: {}", message),
        Event::MuteChanged { muted } => {
            if *muted { "muted".to_string() } else { "unmuted".to_string() }
        }
        Event::LevelUpdate { peak } => {
            let bars = (peak.clamp(0.0, 1.0) * 30.0).round() as usize;
            format!("[{:<30}]", "#".repeat(bars))
        }
        Event::StreamError { message } => format!("stream error: {}", message),
        Event::BufferUnderrun => "buffer underrun".to_string(),
        Event::BufferOverrun => "buffer overrun, capture samples dropped".to_string(),
    }
}

fn print_status(booth: &SessionController, json: bool) -> Result<()> {
    let snapshot = booth.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
        return Ok(());
    }

    println!(
        "{} | door {} | {} | preset {} | volume {:.2}{} | echo {:.2} | room {:.2}",
        snapshot.phase,
        if snapshot.door_open { "open" } else { "closed" },
        match snapshot.phase {
            booth_core::Phase::Countdown => format!("starts in {}", snapshot.countdown_seconds),
            _ => snapshot.remaining_display.clone(),
        },
        snapshot.preset,
        snapshot.volume,
        if snapshot.muted { " (muted)" } else { "" },
        snapshot.echo,
        snapshot.room,
    );
    if let Some(latency) = booth.engine().latency_estimate() {
        println!(
            "monitor {} Hz, base latency {:?}s, output latency {:?}s",
            latency.sample_rate, latency.base_latency, latency.output_latency
        );
    }
    Ok(())
}
