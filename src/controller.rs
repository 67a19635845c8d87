//! # Controller
//!
//! The sole control surface into the core. Owns the connection manager, the
//! status publisher, and the two driver tasks that bridge the external
//! sources to the pure state machines.
//!
//! ## Ownership Model:
//! Each piece of mutable state lives in exactly one task: the link task owns
//! the session and backoff, the motion driver owns the encoder's throttle
//! state, the speech driver owns the normalizer's dedup state. The
//! controller only starts, stops, and observes them; stopping one source
//! never touches the other source or the connection.
//!
//! ## Control Surface:
//! `connect`, `disconnect`, `start_motion`, `stop_motion`, `start_listening`,
//! `stop_listening`, `set_gestures_enabled`, plus `status`/`subscribe` for
//! the presentation layer.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until};
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, SpeechConfig, SpeechMode};
use crate::error::LinkError;
use crate::link::channel::MessageChannel;
use crate::link::manager::ConnectionManager;
use crate::message::{CommandEvent, GestureEvent, OutboundMessage};
use crate::motion::encoder::MotionEventEncoder;
use crate::motion::source::{MotionSample, MotionSource};
use crate::speech::normalizer::{CommandNormalizer, TranscriptDecision};
use crate::speech::source::{SpeechEvent, SpeechSource};
use crate::status::{ConnectionStatus, StatusPublisher, StatusSnapshot};

/// Client core: one connection, one motion pipeline, one speech pipeline.
pub struct Controller {
    config: AppConfig,
    status: StatusPublisher,
    connection: ConnectionManager,
    channel: MessageChannel,
    motion_source: Arc<dyn MotionSource>,
    speech_source: Arc<dyn SpeechSource>,
    motion_task: Mutex<Option<JoinHandle<()>>>,
    speech_task: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Build the core around the given sources. The link task starts idle;
    /// nothing touches the network until [`connect`](Self::connect).
    pub fn new(
        config: AppConfig,
        motion_source: Arc<dyn MotionSource>,
        speech_source: Arc<dyn SpeechSource>,
    ) -> Self {
        let status = StatusPublisher::new();
        let connection = ConnectionManager::start(config.link.clone(), status.clone());
        let channel = connection.channel();

        Self {
            config,
            status,
            connection,
            channel,
            motion_source,
            speech_source,
            motion_task: Mutex::new(None),
            speech_task: Mutex::new(None),
        }
    }

    /// Open (or re-open) the controller session.
    pub fn connect(&self) {
        self.connection.connect();
    }

    /// Close the session and cancel all reconnect timers.
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Begin motion sampling. The first sample marks stream start and emits
    /// exactly one `motion_started`. A denied sensor permission is surfaced
    /// to status and the feature simply does not start.
    pub fn start_motion(&self) {
        let mut task = self.motion_task.lock().unwrap();
        // A driver that ended on its own (sample stream closed) leaves a
        // finished handle behind; only a live one blocks a restart.
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Motion already active");
            return;
        }

        match self.motion_source.start(self.config.motion.sample_period()) {
            Ok(samples) => {
                let encoder = MotionEventEncoder::new(self.config.motion.clone());
                let channel = self.channel.clone();
                *task = Some(tokio::spawn(motion_driver(samples, encoder, channel)));
                self.status.set_motion_active(true);
                info!("Motion sampling started");
            }
            Err(err) => {
                warn!("Motion not started: {}", err);
                self.status
                    .set_connection(ConnectionStatus::Error(err.to_string()));
            }
        }
    }

    /// Stop motion sampling and clear the encoder state with it; the next
    /// start re-emits `motion_started`.
    pub fn stop_motion(&self) {
        let mut task = self.motion_task.lock().unwrap();
        if let Some(handle) = task.take() {
            self.motion_source.stop();
            handle.abort();
            self.status.set_motion_active(false);
            info!("Motion sampling stopped");
        }
    }

    /// Begin a recognition session in the configured delivery mode. A denied
    /// speech permission is surfaced to status and listening does not start.
    /// Listening abandoned by an engine failure can be restarted from here.
    pub fn start_listening(&self) {
        let mut task = self.speech_task.lock().unwrap();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Already listening");
            return;
        }

        let partials = self.config.speech.mode == SpeechMode::Continuous;
        match self.speech_source.start(partials) {
            Ok(events) => {
                let driver = speech_driver(
                    Arc::clone(&self.speech_source),
                    self.config.speech.clone(),
                    self.status.clone(),
                    self.channel.clone(),
                    events,
                );
                *task = Some(tokio::spawn(driver));
                self.status.set_listening(true);
                info!("Listening started ({:?})", self.config.speech.mode);
            }
            Err(err) => {
                warn!("Listening not started: {}", err);
                self.status
                    .set_connection(ConnectionStatus::Error(err.to_string()));
            }
        }
    }

    /// Tear down the recognition session and its debounce timer.
    pub fn stop_listening(&self) {
        let mut task = self.speech_task.lock().unwrap();
        if let Some(handle) = task.take() {
            self.speech_source.cancel();
            handle.abort();
            self.status.set_listening(false);
            info!("Listening stopped");
        }
    }

    /// Publish the informational gesture toggle. The flag is for the remote
    /// side; it does not gate the encoder locally.
    pub fn set_gestures_enabled(&self, enabled: bool) {
        self.status.set_gestures_enabled(enabled);
        self.channel
            .publish(OutboundMessage::Gesture(GestureEvent::GesturesToggle {
                enabled,
            }));
        info!("Gestures toggled {}", if enabled { "on" } else { "off" });
    }

    /// Current observable state.
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    /// Subscribe to observable state changes.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Ok(mut task) = self.motion_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
        if let Ok(mut task) = self.speech_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

/// Bridge the sample channel into the encoder and publish what comes out.
/// Never blocks the sampling source: publishing is fire-and-forget.
async fn motion_driver(
    mut samples: mpsc::Receiver<MotionSample>,
    mut encoder: MotionEventEncoder,
    channel: MessageChannel,
) {
    while let Some(sample) = samples.recv().await {
        for event in encoder.ingest(&sample, Instant::now()) {
            channel.publish(OutboundMessage::Gesture(event));
        }
    }
    debug!("Motion sample stream ended");
}

/// How one recognition session ended.
enum SessionOutcome {
    /// Commit point: send the command if any, then restart recognition
    Commit(Option<CommandEvent>),
    /// Engine failure or stream end: abandon listening, no auto-restart
    Abandon,
}

/// Bridge recognition sessions into the normalizer. Runs sessions back to
/// back: each commit tears the session down and, after the restart delay,
/// opens a fresh one. Ends for good when the engine fails.
async fn speech_driver(
    source: Arc<dyn SpeechSource>,
    config: SpeechConfig,
    status: StatusPublisher,
    channel: MessageChannel,
    mut events: mpsc::Receiver<SpeechEvent>,
) {
    let mut normalizer = CommandNormalizer::new(config.clone());
    let partials = config.mode == SpeechMode::Continuous;

    loop {
        match run_recognition_session(&mut events, &mut normalizer, &status).await {
            SessionOutcome::Commit(command) => {
                if let Some(command) = command {
                    info!("Command: {}", command.text);
                    channel.publish(OutboundMessage::Command(command));
                }

                source.cancel();
                normalizer.on_restart();
                sleep(config.restart_delay()).await;

                events = match source.start(partials) {
                    Ok(rx) => rx,
                    Err(err) => {
                        warn!("Recognition restart failed: {}", err);
                        status.set_connection(ConnectionStatus::Error(err.to_string()));
                        status.set_listening(false);
                        return;
                    }
                };
            }
            SessionOutcome::Abandon => {
                source.cancel();
                status.set_listening(false);
                return;
            }
        }
    }
}

/// Pump one recognition session: candidates update the preview and feed the
/// normalizer; the armed debounce deadline is a select arm with
/// cancel-and-replace semantics (re-created from the normalizer's state each
/// iteration).
async fn run_recognition_session(
    events: &mut mpsc::Receiver<SpeechEvent>,
    normalizer: &mut CommandNormalizer,
    status: &StatusPublisher,
) -> SessionOutcome {
    loop {
        let deadline = normalizer
            .pending_deadline()
            .map(tokio::time::Instant::from_std);

        tokio::select! {
            event = events.recv() => match event {
                Some(SpeechEvent::Candidate(candidate)) => {
                    status.set_transcript_preview(&candidate.text);
                    if let TranscriptDecision::Commit(command) =
                        normalizer.on_candidate(&candidate, Instant::now())
                    {
                        return SessionOutcome::Commit(command);
                    }
                }
                Some(SpeechEvent::Error(detail)) => {
                    let err = LinkError::Recognition(detail);
                    error!("{}", err);
                    status.set_connection(ConnectionStatus::Error(err.to_string()));
                    return SessionOutcome::Abandon;
                }
                None => {
                    debug!("Recognition stream ended");
                    return SessionOutcome::Abandon;
                }
            },

            _ = sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                if let TranscriptDecision::Commit(command) = normalizer.on_debounce(Instant::now()) {
                    return SessionOutcome::Commit(command);
                }
            }
        }
    }
}
