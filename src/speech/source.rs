//! # Speech Source
//!
//! The recognizer seam. A speech source runs one recognition session at a
//! time, delivering transcript candidates tagged partial/final as they come,
//! plus engine failures. The core starts, cancels, and restarts sessions at
//! the moments the normalizer dictates; the engine behind the seam is not
//! its concern.

use tokio::sync::mpsc;

use crate::error::LinkResult;

/// One transcript hypothesis from the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptCandidate {
    /// Raw transcript text as delivered by the engine
    pub text: String,
    /// Whether the engine finalized this hypothesis
    pub is_final: bool,
}

/// Everything a recognition session can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// A transcript hypothesis, partial or final
    Candidate(TranscriptCandidate),
    /// Engine failure; the current session is abandoned
    Error(String),
}

/// Source of transcript candidates.
///
/// ## Contract:
/// - `start` opens a fresh recognition session; `partials` controls whether
///   non-final candidates are delivered at all (continuous vs push-to-talk).
///   It fails with `AuthorizationDenied` when speech permission is not
///   granted, in which case listening simply does not start.
/// - `cancel` tears the session down; the event channel closes afterwards.
/// - Candidates arrive in generation order.
pub trait SpeechSource: Send + Sync {
    fn start(&self, partials: bool) -> LinkResult<mpsc::Receiver<SpeechEvent>>;
    fn cancel(&self);
}
