//! PetPal: Main Entry Point
//!
//! Hexagonal architecture with a fixed-rate frame loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SyntheticCamera   ScriptedClassifier   ConsoleDisplay         │
//! │  (CameraPort)      (ClassifierPort)     (DisplayPort)          │
//! │  LogEventSink      JsonFileConfig       SystemClock            │
//! │  (EventSink)       (ConfigPort)         (TimePort)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              PetService (pure logic)                   │    │
//! │  │  Smoother · FSM · Scheduler · Event queue              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Detector (camera → classifier → PetService::observe)          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `petpal [config.json] [--manual-only]`, then type commands on
//! stdin (`help` lists them).
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use petpal::adapters::console::ConsoleDisplay;
use petpal::adapters::json_config::JsonFileConfig;
use petpal::adapters::log_sink::LogEventSink;
use petpal::adapters::scripted::{
    BACKGROUND_LABEL, HOUSEHOLD_LABELS, ScriptedClassifier, SyntheticCamera,
};
use petpal::adapters::time::SystemClock;
use petpal::app::commands::AppCommand;
use petpal::app::detector::Detector;
use petpal::app::ports::{ConfigPort, TimePort};
use petpal::app::service::PetService;
use petpal::error::InitFailure;
use petpal::fsm::StateId;

const DEFAULT_CONFIG_PATH: &str = "petpal.json";
const DEFAULT_SHOW_CONFIDENCE: f32 = 0.95;

// ── Console commands ──────────────────────────────────────────

#[derive(Debug)]
enum ConsoleCommand {
    App(AppCommand),
    Show(String, f32),
    Hide,
    Fail(bool),
    Save,
    Help,
    Quit,
}

fn parse_state(name: &str) -> Option<StateId> {
    match name.to_ascii_lowercase().as_str() {
        "start" => Some(StateId::Start),
        "neutral" => Some(StateId::Neutral),
        "happy" => Some(StateId::Happy),
        "sad" => Some(StateId::Sad),
        _ => None,
    }
}

fn parse_line(line: &str) -> Option<ConsoleCommand> {
    let mut words = line.split_whitespace();
    let cmd = words.next()?;
    match cmd {
        "press" => words
            .next()
            .map(|label| ConsoleCommand::App(AppCommand::Press(label.to_owned()))),
        "show" => {
            let label = words.next()?.to_owned();
            let p = match words.next() {
                Some(p) => p.parse().ok()?,
                None => DEFAULT_SHOW_CONFIDENCE,
            };
            Some(ConsoleCommand::Show(label, p))
        }
        "hide" => Some(ConsoleCommand::Hide),
        "fail" => match words.next() {
            Some("on") => Some(ConsoleCommand::Fail(true)),
            Some("off") => Some(ConsoleCommand::Fail(false)),
            _ => None,
        },
        "state" => parse_state(words.next()?)
            .map(|s| ConsoleCommand::App(AppCommand::ForceState(s))),
        "status" => Some(ConsoleCommand::App(AppCommand::EmitTelemetry)),
        "save" => Some(ConsoleCommand::Save),
        "help" => Some(ConsoleCommand::Help),
        "quit" | "exit" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

fn spawn_stdin_reader() -> Receiver<ConsoleCommand> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => warn!("Unknown command: '{}' (try 'help')", line.trim()),
            }
        }
        // EOF on stdin ends the session.
        let _ = tx.send(ConsoleCommand::Quit);
    });
    rx
}

fn print_help() {
    info!("Commands:");
    info!("  press <item>        click an item button (e.g. press carrot)");
    info!("  show <item> [p]     hold an item up to the camera");
    info!("  hide                put the item away");
    info!("  fail on|off         make the classifier fail");
    info!("  state <name>        force start|neutral|happy|sad");
    info!("  status              print a telemetry snapshot");
    info!("  save                write the current config to disk");
    info!("  quit                exit");
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  PetPal v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Arguments ──────────────────────────────────────────
    let mut config_path = DEFAULT_CONFIG_PATH.to_owned();
    let mut manual_only = false;
    for arg in std::env::args().skip(1) {
        if arg == "--manual-only" {
            manual_only = true;
        } else {
            config_path = arg;
        }
    }

    // ── 2. Config ─────────────────────────────────────────────
    let store = JsonFileConfig::new(&config_path);
    let mut service = PetService::from_port(&store)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    let config = service.current_config();

    // ── 3. Adapters ───────────────────────────────────────────
    let clock = SystemClock::new();
    let mut display = ConsoleDisplay::new();
    let mut sink = LogEventSink::new();

    service.start(clock.now_ms(), &mut display, &mut sink);

    let (camera, classifier) = if manual_only {
        info!("Manual-only mode: automatic detection disabled");
        (
            Err(InitFailure::CameraUnavailable),
            Err(InitFailure::ClassifierUnavailable),
        )
    } else {
        let mut labels = vec![config.food_keyword.as_str(), BACKGROUND_LABEL];
        labels.extend_from_slice(HOUSEHOLD_LABELS);
        (SyntheticCamera::open(), ScriptedClassifier::load(&labels))
    };
    let mut detector: Detector<SyntheticCamera, ScriptedClassifier> =
        Detector::from_init(camera, classifier, &mut service, &mut display, &mut sink);

    let commands = spawn_stdin_reader();
    print_help();
    info!("System ready. Entering frame loop.");

    // ── 4. Frame loop ─────────────────────────────────────────
    let frame_interval = Duration::from_millis(config.frame_interval_ms);
    'frames: loop {
        std::thread::sleep(frame_interval);
        let now = clock.now_ms();

        loop {
            let cmd = match commands.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'frames,
            };
            match cmd {
                ConsoleCommand::App(app_cmd) => {
                    service.handle_command(now, app_cmd, &mut display, &mut sink);
                }
                ConsoleCommand::Show(label, p) => match detector.classifier_mut() {
                    Some(classifier) => {
                        if !classifier.set_scene(&label, p) {
                            warn!(
                                "Model has no class '{}'; known: {}",
                                label,
                                classifier.labels().join(", ")
                            );
                        }
                    }
                    None => warn!("No classifier; use 'press {}' instead", label),
                },
                ConsoleCommand::Hide => {
                    if let Some(classifier) = detector.classifier_mut() {
                        classifier.clear();
                    }
                }
                ConsoleCommand::Fail(failing) => {
                    if let Some(classifier) = detector.classifier_mut() {
                        classifier.set_failing(failing);
                        info!("Classifier failing: {}", classifier.is_failing());
                    }
                }
                ConsoleCommand::Save => match store.save(&service.current_config()) {
                    Ok(()) => info!("Config saved to {}", store.path().display()),
                    Err(e) => warn!("Config save failed: {}", e),
                },
                ConsoleCommand::Help => print_help(),
                ConsoleCommand::Quit => break 'frames,
            }
        }

        detector.tick(now, &mut service, &mut display, &mut sink);
        service.advance(now, &mut display, &mut sink);
    }

    let telemetry = service.build_telemetry(clock.now_ms());
    info!(
        "Session over after {}s: {} feedings, {} frames classified",
        clock.uptime_secs(),
        telemetry.feedings,
        telemetry.frames_classified
    );
    Ok(())
}
