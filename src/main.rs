//! Proctor Signal CLI
//!
//! Runs recorded or live landmark streams through the integrity engine.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use proctor_signal_engine::{
    audit::{create_shared_log_with_persistence, SessionLog},
    config::Config,
    core::ReportBuilder,
    engine::{Engine, EngineEvent, Verdict},
    replay::{FrameReader, RecordedFrame, ReplayError},
    sink::{ChannelSink, NoopSink},
    MONITORING_NOTICE, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Events buffered between the engine and the printer in `watch`.
const EVENT_BUFFER: usize = 256;

#[derive(Parser)]
#[command(name = "proctor-signal")]
#[command(version = VERSION)]
#[command(about = "Integrity signals from face-mesh landmarks", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded JSON Lines landmark stream through the engine
    Replay {
        /// Recording to replay
        file: PathBuf,

        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the session report here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print every frame verdict, not just alerts
        #[arg(long, short)]
        verbose: bool,
    },

    /// Read landmark frames from stdin and print alerts as they fire
    Watch {
        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show cumulative session statistics
    Status,

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },

    /// Display the candidate monitoring notice
    Notice,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Replay {
            file,
            config,
            report,
            verbose,
        } => cmd_replay(&file, config.as_deref(), report.as_deref(), verbose),
        Commands::Watch { config } => cmd_watch(config.as_deref()),
        Commands::Status => cmd_status(),
        Commands::Config { init } => cmd_config(init),
        Commands::Notice => {
            println!("{MONITORING_NOTICE}");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("could not load config from {}", path.display())),
        None => Config::load().context("could not load config"),
    }
}

fn cmd_replay(
    file: &Path,
    config_path: Option<&Path>,
    report_path: Option<&Path>,
    verbose: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let session_log =
        create_shared_log_with_persistence(config.data_path.join("session_log.json"));
    let mut engine = Engine::new(config.engine.clone(), NoopSink)?;
    let mut report = ReportBuilder::new().with_label(file.display().to_string());

    println!("Proctor Signal v{VERSION}");
    println!("Replaying {}", file.display());
    println!("Session ID: {}", report.session_id());
    println!();

    let base = Instant::now();
    let started = Utc::now();
    let reader = FrameReader::open(file)
        .with_context(|| format!("could not open recording {}", file.display()))?;

    let mut skipped = 0usize;
    for entry in reader {
        let (line, recorded) = match entry {
            Ok(entry) => entry,
            Err(e @ ReplayError::ParseError { .. }) => {
                eprintln!("Warning: Skipping frame: {e}");
                skipped += 1;
                continue;
            }
            Err(e) => {
                save_session_log(&session_log);
                return Err(e.into());
            }
        };
        // Unstamped frames reuse the base so a replay stays deterministic
        let now = recorded.at(base).unwrap_or(base);
        let elapsed = now.saturating_duration_since(base);
        let at = started
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        let verdict = engine.process_at(&recorded.frame, now);
        session_log.record(&verdict);
        report.observe_at(&verdict, at);

        print_verdict(line, elapsed, &verdict, verbose);
    }

    let summary = report.build();
    println!();
    println!("Frames processed: {}", summary.frames.total);
    if skipped > 0 {
        println!("Lines skipped: {skipped}");
    }
    println!("Alerts dispatched: {}", summary.alerts.len());
    println!(
        "Violations: gaze {}, head pose {}, face {}, tab switch {}",
        summary.violations.gaze,
        summary.violations.head_pose,
        summary.violations.face,
        summary.violations.tab_switch
    );
    println!("Final score: {:.1} ({})", summary.final_score, summary.tier_label);
    println!("{}", summary.narrative);

    save_session_log(&session_log);

    if let Some(path) = report_path {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, report.build_json())
            .with_context(|| format!("could not write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn save_session_log(session_log: &SessionLog) {
    if let Err(e) = session_log.save() {
        eprintln!("Warning: Could not save session log: {e}");
    }
}

fn print_verdict(line: usize, elapsed: Duration, verdict: &Verdict, verbose: bool) {
    let stamp = format!("{:>8.3}s", elapsed.as_secs_f64());

    if verbose {
        println!(
            "[{stamp}] line {line:>5} | {:<14} | score {:>5.1} | counter {}",
            verdict.status_label(),
            verdict.score,
            verdict.gaze_out_counter
        );
    }
    for alert in &verdict.alerts {
        println!("[{stamp}] {alert} (score {:.1})", verdict.score);
    }
}

fn cmd_watch(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (sink, events) = ChannelSink::new(EVENT_BUFFER);
    let mut engine = Engine::new(config.engine.clone(), sink)?;

    println!("Proctor Signal v{VERSION}");
    println!("Reading landmark frames from stdin. Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let (frame_tx, frames) =
        crossbeam_channel::bounded::<Result<(usize, RecordedFrame), ReplayError>>(EVENT_BUFFER);
    thread::spawn(move || {
        for entry in FrameReader::new(std::io::stdin().lock()) {
            if frame_tx.send(entry).is_err() {
                break;
            }
        }
    });

    let base = Instant::now();
    let mut report = ReportBuilder::new();

    while running.load(Ordering::SeqCst) {
        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok((_, recorded))) => {
                let now = recorded.at(base).unwrap_or_else(Instant::now);
                report.observe(&engine.process_at(&recorded.frame, now));
            }
            Ok(Err(e)) => eprintln!("Warning: Skipping frame: {e}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        drain_events(&events);
    }

    drain_events(&events);

    let summary = report.build();
    println!();
    println!("Stopping...");
    println!("Frames processed: {}", summary.frames.total);
    println!("Final score: {:.1} ({})", summary.final_score, summary.tier_label);

    Ok(())
}

fn drain_events(events: &Receiver<EngineEvent>) {
    for event in events.try_iter() {
        match event {
            EngineEvent::Alert { message, score, at } => {
                println!("[{}] {message} (score {score:.1})", at.format("%H:%M:%S"));
            }
            EngineEvent::ScoreChanged { current, .. } => {
                tracing::debug!(score = current, "score changed");
            }
        }
    }
}

fn cmd_status() -> anyhow::Result<()> {
    let config = load_config(None)?;
    let log_path = config.data_path.join("session_log.json");

    println!("Proctor Signal Status");
    println!("=====================");
    println!();

    if log_path.exists() {
        let log = create_shared_log_with_persistence(log_path);
        println!("{}", log.summary());
    } else {
        println!("No previous session data found.");
    }

    Ok(())
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    let config = load_config(None)?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if init {
        config.save()?;
        config.ensure_directories()?;
        println!();
        println!("Saved to {:?}", Config::config_path());
    }

    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("could not set Ctrl+C handler")
}
