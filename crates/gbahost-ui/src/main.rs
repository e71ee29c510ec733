use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gbahost_ui::config::{self, HostConfig, ScreenshotFormat, SpeedDisplay};
use gbahost_ui::host::{Host, HostError, ScheduledAction};
use gbahost_ui::pattern::{LCD_HEIGHT, LCD_WIDTH, PatternEngine};
use gbahost_ui::surface::Surface;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Headless frontend host for a handheld emulator")]
struct Args {
    /// Path to ROM file; names the savestate, battery and screenshot files
    rom: PathBuf,

    /// Config file (defaults to the per-user gbahost.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 0: Shift+Fn saves, 1: Fn saves, 2: F5/F6 select slot, F7/F8 save/load
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
    save_key_mode: Option<u8>,

    /// Keep the frame-skip level fixed
    #[arg(long)]
    no_auto_frameskip: bool,

    /// Frame-skip level (0-9); the starting level when auto frame skip is on
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    frameskip: Option<u8>,

    /// Pace emulation at this percent of real time; 0 disables pacing
    #[arg(long)]
    throttle: Option<u32>,

    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[arg(long)]
    battery_dir: Option<PathBuf>,

    #[arg(long)]
    screenshot_dir: Option<PathBuf>,

    /// Fallback root for per-game files
    #[arg(long)]
    home_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    capture_format: Option<CaptureArg>,

    #[arg(long, value_enum)]
    show_speed: Option<SpeedArg>,

    /// Number of host ticks to run
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Surface width in pixels (defaults from the configured window size)
    #[arg(long)]
    width: Option<usize>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<usize>,

    /// Scripted input, e.g. `--at 60=shift+f1 --at 120=f1`
    #[arg(long = "at", value_name = "FRAME=ACTION")]
    actions: Vec<ScheduledAction>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CaptureArg {
    Png,
    Bmp,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SpeedArg {
    Off,
    Percent,
    Detailed,
}

fn load_config(args: &Args) -> Result<HostConfig, HostError> {
    let mut cfg = match &args.config {
        Some(path) => config::try_load(path)?,
        None => config::load_from_file(&config::default_config_path()),
    };

    if let Some(mode) = args.save_key_mode {
        cfg.save_key_mode = mode;
    }
    if args.no_auto_frameskip {
        cfg.auto_frame_skip = false;
    }
    if let Some(level) = args.frameskip {
        cfg.frame_skip = level;
    }
    if let Some(throttle) = args.throttle {
        cfg.throttle = throttle;
    }
    if args.state_dir.is_some() {
        cfg.state_dir = args.state_dir.clone();
    }
    if args.battery_dir.is_some() {
        cfg.battery_dir = args.battery_dir.clone();
    }
    if args.screenshot_dir.is_some() {
        cfg.screenshot_dir = args.screenshot_dir.clone();
    }
    if args.home_dir.is_some() {
        cfg.home_dir = args.home_dir.clone();
    }
    if let Some(format) = args.capture_format {
        cfg.capture_format = match format {
            CaptureArg::Png => ScreenshotFormat::Png,
            CaptureArg::Bmp => ScreenshotFormat::Bmp,
        };
    }
    if let Some(speed) = args.show_speed {
        cfg.show_speed = match speed {
            SpeedArg::Off => SpeedDisplay::Off,
            SpeedArg::Percent => SpeedDisplay::Percent,
            SpeedArg::Detailed => SpeedDisplay::Detailed,
        };
    }
    Ok(cfg)
}

fn run(args: Args) -> Result<(), HostError> {
    let cfg = load_config(&args)?;

    let (default_w, default_h) = match cfg.window_size.scale_factor_px() {
        Some(scale) => (LCD_WIDTH * scale as usize, LCD_HEIGHT * scale as usize),
        None => (
            cfg.fullscreen_resolution[0] as usize,
            cfg.fullscreen_resolution[1] as usize,
        ),
    };
    let surface = Surface::new(
        args.width.unwrap_or(default_w),
        args.height.unwrap_or(default_h),
        cfg.status_duration(),
        cfg.status_messages,
    )
    .with_integer_scaling(cfg.window_size.use_integer_scaling());

    let mut host = Host::new(PatternEngine::new(), &args.rom, &cfg, surface)?;
    for entry in args.actions {
        host.schedule(entry);
    }

    let summary = host.run(args.frames);
    host.shutdown();
    info!(
        "Ran {} ticks: {} frames emulated, {} rendered",
        summary.ticks, summary.emulated, summary.rendered
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
