//! # Command Normalizer
//!
//! Converts the candidate stream into discrete, deduplicated commands. Pure
//! state machine: the speech driver feeds it candidates and debounce firings
//! with explicit timestamps and acts on the returned decision, so every
//! timing rule is testable without timers.
//!
//! ## Delivery Modes:
//! - **Continuous**: finals commit immediately; partials (re)arm a ~1.3s
//!   debounce, except a partial exactly repeating the last sent command
//!   within ~0.8s, which is ignored outright so mere repetition cannot keep
//!   re-arming the timer.
//! - **Push-to-talk**: only finals are acted upon.
//!
//! Every commit is followed by a recognition restart, driven by the caller.
//! A restart clears the per-session state (last heard transcript, pending
//! debounce) but the last-sent record survives it, so the ~1.0s dedup gate
//! holds across the restart that follows every send.

use std::time::Instant;

use crate::config::{SpeechConfig, SpeechMode};
use crate::message::CommandEvent;
use crate::speech::rules;
use crate::speech::source::TranscriptCandidate;

/// What the speech driver should do with a candidate or debounce firing.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptDecision {
    /// Commit point reached: send the command if one survived normalization
    /// and the dedup gate, then restart recognition either way.
    Commit(Option<CommandEvent>),
    /// (Re)arm the debounce timer to fire at this deadline, replacing any
    /// pending one.
    ArmDebounce(Instant),
    /// Nothing to do.
    Ignore,
}

/// Per-recognizer dedup/debounce state machine.
pub struct CommandNormalizer {
    config: SpeechConfig,
    /// Raw text of the most recent candidate, whatever its kind
    last_heard: Option<String>,
    /// Normalized text and send time of the last command actually sent
    last_sent: Option<(String, Instant)>,
    /// Deadline of the armed debounce, if any
    pending_deadline: Option<Instant>,
}

impl CommandNormalizer {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            last_heard: None,
            last_sent: None,
            pending_deadline: None,
        }
    }

    /// Deadline of the currently armed debounce, for the driver's timer.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending_deadline
    }

    /// Feed one candidate observed at `now`.
    pub fn on_candidate(
        &mut self,
        candidate: &TranscriptCandidate,
        now: Instant,
    ) -> TranscriptDecision {
        self.last_heard = Some(candidate.text.clone());

        match self.config.mode {
            SpeechMode::PushToTalk => {
                if candidate.is_final {
                    self.pending_deadline = None;
                    TranscriptDecision::Commit(self.commit(&candidate.text, now))
                } else {
                    // Partials are suppressed at the source in this mode;
                    // one that slips through is not acted upon.
                    TranscriptDecision::Ignore
                }
            }
            SpeechMode::Continuous => {
                if candidate.is_final {
                    self.pending_deadline = None;
                    return TranscriptDecision::Commit(self.commit(&candidate.text, now));
                }

                // A partial that exactly repeats the last sent command is
                // dropped for a short window instead of re-arming the timer.
                if let Some((sent_text, sent_at)) = &self.last_sent {
                    if candidate.text == *sent_text
                        && now.duration_since(*sent_at) < self.config.repeat_ignore()
                    {
                        return TranscriptDecision::Ignore;
                    }
                }

                let deadline = now + self.config.debounce();
                self.pending_deadline = Some(deadline);
                TranscriptDecision::ArmDebounce(deadline)
            }
        }
    }

    /// The armed debounce fired at `now`: commit whatever was last heard.
    pub fn on_debounce(&mut self, now: Instant) -> TranscriptDecision {
        if self.pending_deadline.take().is_none() {
            return TranscriptDecision::Ignore;
        }

        match self.last_heard.clone() {
            Some(heard) => TranscriptDecision::Commit(self.commit(&heard, now)),
            None => TranscriptDecision::Ignore,
        }
    }

    /// Reset per-session state for a recognition restart. The last-sent
    /// record is deliberately kept: the dedup window spans the restart that
    /// follows every send.
    pub fn on_restart(&mut self) {
        self.last_heard = None;
        self.pending_deadline = None;
    }

    /// Normalize and apply the final dedup gate. Returns the command to
    /// send, or `None` when it normalized to nothing or repeated the last
    /// sent command inside the dedup window. Dropped commands do not refresh
    /// the last-sent timestamp.
    fn commit(&mut self, raw: &str, now: Instant) -> Option<CommandEvent> {
        let text = rules::normalize(raw);
        if text.is_empty() {
            return None;
        }

        if let Some((sent_text, sent_at)) = &self.last_sent {
            if *sent_text == text && now.duration_since(*sent_at) < self.config.dedup_window() {
                return None;
            }
        }

        self.last_sent = Some((text.clone(), now));
        Some(CommandEvent { text })
    }
}
