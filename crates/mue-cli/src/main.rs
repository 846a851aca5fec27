use clap::{Parser, ValueEnum};
use mue_core::backend::{HeadlessBackend, SharedBackend};
use mue_core::errors::Stage;
use mue_core::fatal;
use mue_core::scripting::{EnvironmentOptions, ScriptEnvironment};
use mue_core::{FatalError, Lifecycle, ENTRY_SCRIPT};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding main.rhai
    #[arg(value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// Rendering backend
    #[arg(long, value_enum, default_value_t = DEFAULT_BACKEND)]
    backend: BackendKind,

    /// Close the window after this many frames.
    ///
    /// Both backends are off-screen with no close button or keyboard, so
    /// without a limit the frame loop runs until the process is interrupted.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Write the last frame as PNG (skia backend)
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Write the recorded draw commands as JSON (headless backend)
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Operation limit per script call, 0 for none
    #[arg(long, default_value_t = 0)]
    max_operations: u64,

    /// Function call depth limit, 0 for the engine default
    #[arg(long, default_value_t = 0)]
    max_call_levels: usize,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum BackendKind {
    Skia,
    Headless,
}

#[cfg(feature = "skia")]
const DEFAULT_BACKEND: BackendKind = BackendKind::Skia;
#[cfg(not(feature = "skia"))]
const DEFAULT_BACKEND: BackendKind = BackendKind::Headless;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(cli.log_level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
}

/// Exits before any script state exists.
fn bail(message: impl std::fmt::Display) -> ! {
    error!("{}", message);
    eprintln!("fatal: {message}");
    std::process::exit(fatal::EXIT_FAILURE)
}

fn build_backend(cli: &Cli) -> (SharedBackend, Option<Rc<RefCell<HeadlessBackend>>>) {
    match cli.backend {
        BackendKind::Headless => {
            let mut headless = HeadlessBackend::new();
            if cli.record.is_none() {
                headless = headless.without_recording();
            }
            if let Some(frames) = cli.frames {
                headless = headless.with_frame_limit(frames);
            }
            if cli.snapshot.is_some() {
                warn!("--snapshot is ignored by the headless backend");
            }
            let headless = Rc::new(RefCell::new(headless));
            let shared: SharedBackend = headless.clone();
            (shared, Some(headless))
        }
        #[cfg(feature = "skia")]
        BackendKind::Skia => {
            let mut skia = mue_core::backend::SkiaBackend::new();
            if let Some(frames) = cli.frames {
                skia = skia.with_frame_limit(frames);
            }
            if let Some(path) = &cli.snapshot {
                skia = skia.with_snapshot(path.clone());
            }
            if cli.record.is_some() {
                warn!("--record is ignored by the skia backend");
            }
            let shared: SharedBackend = Rc::new(RefCell::new(skia));
            (shared, None)
        }
        #[cfg(not(feature = "skia"))]
        BackendKind::Skia => bail("this build has no skia backend; use --backend headless"),
    }
}

/// Output paths are taken relative to where the command was started.
fn absolute(path: &Path) -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn write_record(path: &Path, headless: &RefCell<HeadlessBackend>) {
    let result = fs::File::create(path)
        .map_err(|e| e.to_string())
        .and_then(|file| {
            serde_json::to_writer_pretty(file, headless.borrow().frames()).map_err(|e| e.to_string())
        });
    match result {
        Ok(()) => info!("Recording written to {:?}", path),
        Err(e) => warn!("Cannot write recording {:?}: {}", path, e),
    }
}

fn main() {
    let mut cli = Cli::parse();
    init_logging(&cli);

    cli.record = cli.record.as_deref().map(absolute);
    cli.snapshot = cli.snapshot.as_deref().map(absolute);
    if let Err(e) = std::env::set_current_dir(&cli.dir) {
        bail(format!("cannot enter directory {:?}: {}", cli.dir, e));
    }
    info!("Working directory: {:?}", cli.dir);

    if cli.frames.is_none() {
        warn!("No --frames limit: the frame loop runs until interrupted");
    }
    let (backend, headless) = build_backend(&cli);
    let options = EnvironmentOptions {
        module_root: PathBuf::from("."),
        max_call_levels: cli.max_call_levels,
        max_operations: cli.max_operations,
    };

    let mut env = match fatal::guard(|| ScriptEnvironment::create(backend.clone(), &options)) {
        Ok(env) => env,
        Err(e) => fatal::terminate(&e, None),
    };

    let source = match fs::read_to_string(ENTRY_SCRIPT) {
        Ok(source) => source,
        Err(e) => {
            let err = FatalError::ScriptFault {
                stage: Stage::EntryScript,
                message: format!("cannot read {ENTRY_SCRIPT}: {e}"),
            };
            fatal::terminate(&err, Some(&mut env))
        }
    };

    let mut lifecycle = Lifecycle::new(env, backend);
    if let Err(e) = fatal::guard(|| lifecycle.execute(&source)) {
        fatal::terminate(&e, Some(lifecycle.environment_mut()));
    }

    if let (Some(path), Some(headless)) = (&cli.record, headless) {
        write_record(path, &headless);
    }
    info!("Exited after {} frames", lifecycle.frames());
}
