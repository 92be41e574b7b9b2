use clap::Parser;
use env_logger::Env;
use hdrhistogram::Histogram;
use leaffall_config::{load_config, validate, Config, ConfigError, SenderType, SerializerType};
use leaffall_core::{input_channel, FrameScheduler, HostClock, InputSender, PacedScheduler};
use leaffall_simulation::LoopDriver;
use leaffall_transport::{create_renderer, TransportError};
use log::{error, info, warn};
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(author, version, about = "Falling leaves that scatter around the pointer", long_about = None)]
struct Args {
    /// Path to a JSON or TOML configuration file (defaults are used without one)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<f32>,

    /// Fewer leaves and gentler motion
    #[arg(long)]
    reduced_motion: bool,

    /// Stop after this many frames
    #[arg(short, long)]
    frames: Option<u64>,

    /// Seed for reproducible leaves
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    sender: Option<SenderType>,

    #[arg(long, value_enum)]
    serializer: Option<SerializerType>,

    /// Sweep a synthetic pointer in circles through the scene
    #[arg(long)]
    demo_pointer: bool,
}

#[derive(Error, Debug)]
enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to set up transport: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Demo pointer: one lap every this many seconds.
const DEMO_PERIOD: f32 = 6.0;
const DEMO_INTERVAL: Duration = Duration::from_millis(16);

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), RunnerError> {
    let config = load(&args)?;
    let simulation = config.effective_simulation();
    if config.reduced_motion {
        info!("Reduced motion enabled");
    }

    let clock = HostClock::new();
    let (input, input_rx) = input_channel();

    let mut scheduler = PacedScheduler::new(clock, config.framerate).with_frame_limit(args.frames);
    let running = scheduler.running_flag();
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, stopping");
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    let renderer = create_renderer(&config.transport, &input, clock)?;
    let viewport = config.viewport;
    let mut driver = match args.seed {
        Some(seed) => LoopDriver::with_seed(simulation, viewport, renderer, seed),
        None => LoopDriver::new(simulation, viewport, renderer),
    }
    .with_input(input_rx);

    let demo = args
        .demo_pointer
        .then(|| spawn_demo_pointer(input.clone(), clock, viewport.width, viewport.height, running.clone()));

    info!("Running at {} FPS", config.framerate);
    let mut histogram = Histogram::<u64>::new(3).ok();
    driver.start();
    while let Some(now) = scheduler.next_frame() {
        let tick_start = Instant::now();
        driver.frame(now);
        if let Some(histogram) = histogram.as_mut() {
            histogram.saturating_record(tick_start.elapsed().as_micros() as u64);
        }
    }

    scheduler.stop();
    if let Some(handle) = demo {
        if handle.join().is_err() {
            warn!("Demo pointer thread panicked");
        }
    }

    info!(
        "Stopped after {} frames ({:.1}s simulated, {} frames sent)",
        driver.frames(),
        driver.clock().elapsed(),
        driver.renderer().sent()
    );
    if let Some(histogram) = histogram.filter(|h| h.len() > 0) {
        info!(
            "Tick time (us): p50={} p99={} max={}",
            histogram.value_at_quantile(0.5),
            histogram.value_at_quantile(0.99),
            histogram.max()
        );
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied, then validated.
fn load(args: &Args) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Using configuration from {}", path.display());
            config
        }
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };
    apply_overrides(&mut config, args);
    validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }
    if args.reduced_motion {
        config.reduced_motion = true;
    }
    if let Some(sender) = args.sender {
        config.transport.sender = sender;
    }
    if let Some(serializer) = args.serializer {
        config.transport.serializer = serializer;
    }
}

/// Point on the demo path: a circle around the centre, `t` in seconds.
fn demo_position(t: f32, width: f32, height: f32) -> (f32, f32) {
    let radius = 0.3 * width.min(height);
    let phase = t / DEMO_PERIOD * TAU;
    (width / 2.0 + radius * phase.cos(), height / 2.0 + radius * phase.sin())
}

fn spawn_demo_pointer(
    input: InputSender,
    clock: HostClock,
    width: f32,
    height: f32,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    info!("Demo pointer enabled");
    thread::spawn(move || {
        while running.load(Ordering::SeqCst) {
            let now = clock.now();
            let (x, y) = demo_position(now as f32, width, height);
            if !input.pointer_move(x, y, now) {
                break;
            }
            thread::sleep(DEMO_INTERVAL);
        }
    })
}
