//! hostwatch - Host resource alarms.
//!
//! Samples CPU, memory and disk usage and warns when a configured alarm
//! threshold is exceeded.
//!
//! Usage:
//!   hostwatch                       # interactive menu
//!   hostwatch watch                 # surveillance until Ctrl-C
//!   hostwatch alarms list           # configured alarms, lowest threshold first
//!   hostwatch alarms set cpu 80     # alarm when CPU usage exceeds 80%
//!   hostwatch alarms delete disk    # remove the disk alarm

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use hostwatch::alarm::{AlarmStore, MetricKind};
use hostwatch::collector::{ProcfsSampler, RealFs, StatvfsProbe};
use hostwatch::menu::Menu;
use hostwatch::monitor::{CancelFactory, CancelSignal, KeypressSignal, Monitor, ShutdownFlag};

/// Host resource alarms.
#[derive(Parser)]
#[command(name = "hostwatch", about = "Host resource alarms", version)]
struct Args {
    /// JSON file holding the configured alarms.
    #[arg(long, env = "HOSTWATCH_DATA_FILE", default_value = "data/alarms.json")]
    data_file: PathBuf,

    /// Directory for per-session log files.
    #[arg(long, env = "HOSTWATCH_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Seconds between surveillance cycles.
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Milliseconds between the two CPU readings of one sample.
    #[arg(long, default_value = "1000")]
    sample_window: u64,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Mount point whose usage is reported as the disk metric.
    #[arg(long, default_value = "/")]
    disk_path: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu (default).
    Menu,
    /// Run surveillance without the menu until Ctrl-C.
    Watch,
    /// Manage configured alarms.
    #[command(subcommand)]
    Alarms(AlarmsCommand),
}

#[derive(Subcommand)]
enum AlarmsCommand {
    /// Show configured alarms, lowest threshold first.
    List,
    /// Configure or replace the alarm for a metric.
    Set {
        /// CPU, Memory or Disk (case-insensitive).
        kind: String,
        /// Percentage from 1 to 100.
        threshold: u32,
    },
    /// Remove the alarm for a metric.
    Delete {
        /// CPU, Memory or Disk (case-insensitive).
        kind: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match hostwatch::logging::init(&args.log_dir, args.verbose, args.quiet) {
        Ok(path) => info!(
            "hostwatch {} starting, log file {}",
            env!("CARGO_PKG_VERSION"),
            path.display()
        ),
        Err(e) => eprintln!("Warning: logging disabled ({})", e),
    }

    let mut store = match AlarmStore::open(&args.data_file) {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("Hint: {}", hint);
            }
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.command {
        None | Some(Command::Menu) => run_menu(&args, &mut store),
        Some(Command::Watch) => run_watch(&args, &store),
        Some(Command::Alarms(cmd)) => run_alarms(cmd, &mut store),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn sampler(args: &Args) -> ProcfsSampler<RealFs, StatvfsProbe> {
    ProcfsSampler::new(RealFs::new(), &args.proc_path, StatvfsProbe)
        .with_disk_path(&args.disk_path)
        .with_window(Duration::from_millis(args.sample_window))
}

fn run_menu(args: &Args, store: &mut AlarmStore) -> Result<(), Box<dyn std::error::Error>> {
    let cancel: CancelFactory = Box::new(|| -> io::Result<Box<dyn CancelSignal>> {
        Ok(Box::new(KeypressSignal::enable()?))
    });
    let monitor = Monitor::new(Duration::from_secs(args.interval));

    let stdin = io::stdin();
    let mut menu = Menu::new(
        store,
        Box::new(sampler(args)),
        monitor,
        cancel,
        stdin.lock(),
        io::stdout(),
    );
    menu.run()?;
    Ok(())
}

fn run_watch(args: &Args, store: &AlarmStore) -> Result<(), Box<dyn std::error::Error>> {
    let mut shutdown = ShutdownFlag::new();
    if let Err(e) = shutdown.install_ctrlc() {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let monitor = Monitor::new(Duration::from_secs(args.interval))
        .with_banner("Surveillance active. Press Ctrl-C to exit.");
    let mut sampler = sampler(args);
    let mut out = io::stdout();
    let summary = monitor.run(&mut sampler, store, &mut shutdown, &mut out)?;
    writeln!(
        out,
        "Stopped after {} cycle(s), {} alert(s).",
        summary.cycles, summary.alerts
    )?;
    Ok(())
}

fn run_alarms(
    cmd: &AlarmsCommand,
    store: &mut AlarmStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout();
    match cmd {
        AlarmsCommand::List => {
            let sorted = store.sorted();
            if sorted.is_empty() {
                writeln!(out, "No alarms configured.")?;
            }
            for (kind, threshold) in sorted {
                writeln!(out, "{}: {}", kind, threshold)?;
            }
        }
        AlarmsCommand::Set { kind, threshold } => {
            let kind: MetricKind = kind.parse()?;
            let threshold = store.configure(kind, *threshold)?;
            writeln!(out, "Alarm for {} set to {}", kind, threshold)?;
        }
        AlarmsCommand::Delete { kind } => {
            let kind: MetricKind = kind.parse()?;
            let removed = store.delete(kind)?;
            writeln!(out, "Alarm for {} at {} removed", kind, removed)?;
        }
    }
    Ok(())
}
