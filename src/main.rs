//! # Handsfree Link - Main Application Entry Point
//!
//! Runs the client core against the configured controller endpoint with the
//! built-in simulated sources, so the whole pipeline (connect, handshake,
//! keepalive, gestures, voice commands, reconnect) can be exercised from a
//! desk without device hardware.
//!
//! ## What this binary does:
//! 1. **Loads configuration** from config.toml and environment variables
//! 2. **Sets up logging** via tracing
//! 3. **Builds the controller** around the simulated motion/speech sources
//! 4. **Connects and starts both pipelines**
//! 5. **Logs status transitions** until a shutdown signal arrives
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: the entire client is asynchronous
//! - **Arc<dyn Trait>**: sources are injected behind trait objects
//! - **watch channels**: status updates are observed, never polled
//! - **static AtomicBool**: global shutdown flag shared across tasks

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use handsfree_link::config::AppConfig;
use handsfree_link::controller::Controller;
use handsfree_link::error::LinkError;
use handsfree_link::motion::source::MotionSource;
use handsfree_link::sim::{ScriptedSpeechSource, SimulatedMotionSource};
use handsfree_link::speech::source::SpeechSource;
use handsfree_link::status::StatusSnapshot;

/// Global shutdown signal, set by the signal handler task and polled by main.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting handsfree-link v{}", env!("CARGO_PKG_VERSION"));
    info!("Controller endpoint: {}", config.link.url);

    // This build ships only the simulated sources; the platform sensor
    // integrations live with the embedding application.
    let motion_source: Arc<dyn MotionSource> = if config.motion.simulate {
        Arc::new(SimulatedMotionSource::new())
    } else {
        return Err(LinkError::Config(
            "motion.simulate=false, but this build has no platform motion source".to_string(),
        )
        .into());
    };
    let speech_source: Arc<dyn SpeechSource> = if config.speech.simulate {
        Arc::new(ScriptedSpeechSource::new(config.speech.script.clone()))
    } else {
        return Err(LinkError::Config(
            "speech.simulate=false, but this build has no platform speech source".to_string(),
        )
        .into());
    };

    let controller = Controller::new(config, motion_source, speech_source);

    setup_signal_handlers();
    spawn_status_logger(controller.subscribe());

    controller.connect();
    controller.start_motion();
    controller.start_listening();

    wait_for_shutdown().await;

    info!("Shutdown signal received, closing link...");
    controller.stop_listening();
    controller.stop_motion();
    controller.disconnect();
    // Give the close frame a moment to flush before the runtime drops
    tokio::time::sleep(Duration::from_millis(150)).await;

    info!("Link closed");
    Ok(())
}

/// Initialize the tracing (logging) system for the application.
///
/// ## Environment Variables:
/// - `RUST_LOG`: controls what gets logged (e.g. "debug", "handsfree_link=debug")
/// - If not set, defaults to "handsfree_link=debug,tokio_tungstenite=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handsfree_link=debug,tokio_tungstenite=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Mirror status transitions into the log. The watch channel coalesces
/// updates, so this logs the latest state rather than every intermediate one.
fn spawn_status_logger(mut status_rx: watch::Receiver<StatusSnapshot>) {
    tokio::spawn(async move {
        let mut last_status = String::new();
        let mut last_preview = None;

        loop {
            if status_rx.changed().await.is_err() {
                break;
            }
            let snapshot = status_rx.borrow_and_update().clone();

            let status = snapshot.connection.to_string();
            if status != last_status {
                info!("Status: {}", status);
                last_status = status;
            }

            if snapshot.transcript_preview != last_preview {
                if let Some(preview) = snapshot.transcript_preview.as_deref() {
                    debug!("Heard: {}", preview);
                }
                last_preview = snapshot.transcript_preview;
            }
        }
    });
}

/// Set up signal handlers for graceful shutdown.
///
/// Listens for SIGTERM and SIGINT; whichever arrives first sets the global
/// shutdown flag so the main task can tear the link down in order.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Wait for the shutdown signal to be set, checking every 100ms.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
