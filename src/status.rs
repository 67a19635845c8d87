//! # Observable Status
//!
//! Published state the presentation layer reads: the connection phase, the
//! listening/motion/gesture flags, and a live transcript preview. The core
//! writes through explicit setters on [`StatusPublisher`]; consumers hold a
//! [`tokio::sync::watch`] receiver and never touch shared mutable state.
//!
//! ## Connection Lifecycle:
//! 1. **Disconnected**: no session, nothing scheduled
//! 2. **Connecting**: dial in progress or inside the optimistic grace delay
//! 3. **Connected**: session considered live
//! 4. **Reconnecting**: backoff delay running before the next attempt
//! 5. **Error**: a failure was recorded (send failure, denied permission)

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Connection phase of the single controller session.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    /// No session and none scheduled
    Disconnected,
    /// Dialing or inside the connect grace window
    Connecting,
    /// Session considered live
    Connected,
    /// Waiting out the backoff delay before the next attempt
    Reconnecting {
        /// Delay until the next connect attempt
        retry_in: Duration,
    },
    /// A failure was recorded
    Error(String),
}

impl ConnectionStatus {
    /// Short phase token for logs and comparisons.
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting { .. } => "reconnecting",
            ConnectionStatus::Error(_) => "error",
        }
    }
}

/// Human-readable status text shown by the presentation layer.
impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Reconnecting { retry_in } => {
                write!(f, "reconnecting in {}ms", retry_in.as_millis())
            }
            ConnectionStatus::Error(detail) => write!(f, "error: {}", detail),
        }
    }
}

/// Everything the presentation layer can observe, as one value.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Current connection phase
    pub connection: ConnectionStatus,
    /// Whether a recognition session is active
    pub listening: bool,
    /// Whether motion sampling is active
    pub motion_active: bool,
    /// State of the informational gesture switch
    pub gestures_enabled: bool,
    /// Last heard transcript while listening
    pub transcript_preview: Option<String>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            listening: false,
            motion_active: false,
            gestures_enabled: true,
            transcript_preview: None,
        }
    }
}

/// Write side of the observable status.
///
/// ## Thread Safety:
/// Clones share one watch channel; setters use `send_modify` so concurrent
/// writers from the link, motion, and speech tasks never lose each other's
/// fields.
#[derive(Clone)]
pub struct StatusPublisher {
    tx: Arc<watch::Sender<StatusSnapshot>>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot, cloned out of the channel.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    pub fn set_connection(&self, status: ConnectionStatus) {
        self.tx.send_modify(|s| s.connection = status);
    }

    pub fn set_listening(&self, listening: bool) {
        self.tx.send_modify(|s| {
            s.listening = listening;
            if !listening {
                s.transcript_preview = None;
            }
        });
    }

    pub fn set_motion_active(&self, active: bool) {
        self.tx.send_modify(|s| s.motion_active = active);
    }

    pub fn set_gestures_enabled(&self, enabled: bool) {
        self.tx.send_modify(|s| s.gestures_enabled = enabled);
    }

    pub fn set_transcript_preview(&self, text: &str) {
        self.tx
            .send_modify(|s| s.transcript_preview = Some(text.to_string()));
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(
            ConnectionStatus::Reconnecting {
                retry_in: Duration::from_millis(500)
            }
            .to_string(),
            "reconnecting in 500ms"
        );
        assert_eq!(
            ConnectionStatus::Error("socket closed".to_string()).to_string(),
            "error: socket closed"
        );
    }

    #[test]
    fn test_phase_token() {
        assert_eq!(ConnectionStatus::Disconnected.as_str(), "disconnected");
        assert_eq!(
            ConnectionStatus::Reconnecting {
                retry_in: Duration::from_secs(1)
            }
            .as_str(),
            "reconnecting"
        );
    }

    #[test]
    fn test_publisher_updates_are_observable() {
        let publisher = StatusPublisher::new();
        let rx = publisher.subscribe();

        publisher.set_connection(ConnectionStatus::Connecting);
        publisher.set_listening(true);
        publisher.set_transcript_preview("open gma");

        let snapshot = rx.borrow();
        assert_eq!(snapshot.connection, ConnectionStatus::Connecting);
        assert!(snapshot.listening);
        assert_eq!(snapshot.transcript_preview.as_deref(), Some("open gma"));
    }

    #[test]
    fn test_stop_listening_clears_preview() {
        let publisher = StatusPublisher::new();
        publisher.set_listening(true);
        publisher.set_transcript_preview("open gmail");
        publisher.set_listening(false);

        let snapshot = publisher.snapshot();
        assert!(!snapshot.listening);
        assert_eq!(snapshot.transcript_preview, None);
    }
}
