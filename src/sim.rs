//! # Simulated Sources
//!
//! Stand-ins for the device sensors so the full pipeline can run on a desk:
//! a motion source that sweeps gentle tilt angles and throws in a periodic
//! tap spike, and a speech source that plays a configured phrase list as
//! partial-then-final transcript candidates.
//!
//! ## Simulation Behavior:
//! - Motion: sinusoidal roll/pitch at the configured sample period, with an
//!   acceleration spike every few seconds to exercise tap detection
//! - Speech: each phrase is delivered once, as one truncated partial followed
//!   by the final transcript; the phrase list advances across recognition
//!   restarts and the source idles open once it is exhausted

use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::debug;

use crate::error::LinkResult;
use crate::motion::source::{MotionSample, MotionSource};
use crate::speech::source::{SpeechEvent, SpeechSource, TranscriptCandidate};

/// Pause before a simulated recognition session hears anything.
const PHRASE_LEAD_IN: Duration = Duration::from_millis(300);
/// Gap between the truncated partial and the final transcript.
const PARTIAL_TO_FINAL: Duration = Duration::from_millis(250);
/// Spacing of the simulated tap spikes.
const TAP_SPIKE_PERIOD: Duration = Duration::from_secs(3);

/// Motion source that synthesizes a plausible handheld sweep.
pub struct SimulatedMotionSource {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedMotionSource {
    pub fn new() -> Self {
        Self {
            task: Mutex::new(None),
        }
    }
}

impl Default for SimulatedMotionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSource for SimulatedMotionSource {
    fn start(&self, period: Duration) -> LinkResult<mpsc::Receiver<MotionSample>> {
        let (tx, rx) = mpsc::channel(64);
        let spike_every = (TAP_SPIKE_PERIOD.as_secs_f64() / period.as_secs_f64())
            .round()
            .max(1.0) as u64;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;

            loop {
                ticker.tick().await;
                let t = tick as f64 * period.as_secs_f64();
                let sample = MotionSample {
                    roll_rad: 0.35 * (0.8 * t).sin(),
                    pitch_rad: 0.25 * (0.5 * t).sin(),
                    accel_g: if tick > 0 && tick % spike_every == 0 {
                        [0.4, 0.3, 1.2]
                    } else {
                        [0.01, 0.02, 0.03]
                    },
                };

                if tx.send(sample).await.is_err() {
                    break;
                }
                tick += 1;
            }
        });

        let mut slot = self.task.lock().unwrap();
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }

        Ok(rx)
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            debug!("Simulated motion source stopped");
        }
    }
}

/// Speech source that plays a fixed phrase list, one phrase per recognition
/// session. The playback position is shared across sessions, so restarting
/// recognition moves on to the next phrase instead of repeating the first.
pub struct ScriptedSpeechSource {
    script: Vec<String>,
    next_phrase: Mutex<usize>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScriptedSpeechSource {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script,
            next_phrase: Mutex::new(0),
            task: Mutex::new(None),
        }
    }
}

impl SpeechSource for ScriptedSpeechSource {
    fn start(&self, partials: bool) -> LinkResult<mpsc::Receiver<SpeechEvent>> {
        let (tx, rx) = mpsc::channel(16);

        let phrase = {
            let mut index = self.next_phrase.lock().unwrap();
            let phrase = self.script.get(*index).cloned();
            if phrase.is_some() {
                *index += 1;
            }
            phrase
        };

        let task = tokio::spawn(async move {
            let Some(phrase) = phrase else {
                debug!("Script exhausted; recognition session stays idle");
                // Keep the channel open like a recognizer hearing silence.
                std::future::pending::<()>().await;
                return;
            };

            sleep(PHRASE_LEAD_IN).await;

            if partials {
                if let Some(partial) = truncated_partial(&phrase) {
                    let candidate = TranscriptCandidate {
                        text: partial,
                        is_final: false,
                    };
                    if tx.send(SpeechEvent::Candidate(candidate)).await.is_err() {
                        return;
                    }
                    sleep(PARTIAL_TO_FINAL).await;
                }
            }

            let candidate = TranscriptCandidate {
                text: phrase,
                is_final: true,
            };
            let _ = tx.send(SpeechEvent::Candidate(candidate)).await;

            // Hold the session open until it is cancelled.
            std::future::pending::<()>().await;
        });

        let mut slot = self.task.lock().unwrap();
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }

        Ok(rx)
    }

    fn cancel(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// The phrase with the second half of its last word cut off, imitating an
/// in-flight partial transcript. Single-word phrases produce no partial.
fn truncated_partial(phrase: &str) -> Option<String> {
    let (head, last) = phrase.rsplit_once(' ')?;
    let keep = (last.chars().count() + 1) / 2;
    let truncated: String = last.chars().take(keep).collect();
    Some(format!("{} {}", head, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_truncated_partial() {
        assert_eq!(
            truncated_partial("open gmail").as_deref(),
            Some("open gma")
        );
        assert_eq!(truncated_partial("connect").as_deref(), None);
        assert_eq!(
            truncated_partial("type Grüße").as_deref(),
            Some("type Grü")
        );
    }

    #[tokio::test]
    async fn test_scripted_source_plays_partial_then_final() {
        let source = ScriptedSpeechSource::new(vec!["open gmail".to_string()]);
        let mut events = source.start(true).unwrap();

        let first = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        match first {
            SpeechEvent::Candidate(candidate) => {
                assert_eq!(candidate.text, "open gma");
                assert!(!candidate.is_final);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let second = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        match second {
            SpeechEvent::Candidate(candidate) => {
                assert_eq!(candidate.text, "open gmail");
                assert!(candidate.is_final);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_script_advances_across_restarts_then_idles() {
        let source = ScriptedSpeechSource::new(vec![
            "open gmail".to_string(),
            "open twitter.com".to_string(),
        ]);

        // Push-to-talk delivery keeps this test to one event per session.
        let mut events = source.start(false).unwrap();
        let first = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        match first {
            SpeechEvent::Candidate(candidate) => assert_eq!(candidate.text, "open gmail"),
            other => panic!("unexpected event: {:?}", other),
        }

        source.cancel();
        let mut events = source.start(false).unwrap();
        let second = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        match second {
            SpeechEvent::Candidate(candidate) => {
                assert_eq!(candidate.text, "open twitter.com")
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // Exhausted: the next session stays open but silent.
        source.cancel();
        let mut events = source.start(false).unwrap();
        let idle = timeout(Duration::from_millis(600), events.recv()).await;
        assert!(idle.is_err(), "exhausted script should stay silent");
    }

    #[tokio::test]
    async fn test_cancel_closes_the_event_stream() {
        let source = ScriptedSpeechSource::new(vec!["open gmail".to_string()]);
        let mut events = source.start(true).unwrap();

        source.cancel();

        let end = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_simulated_motion_emits_at_period() {
        let source = SimulatedMotionSource::new();
        let mut samples = source.start(Duration::from_millis(5)).unwrap();

        for _ in 0..3 {
            let sample = timeout(Duration::from_secs(2), samples.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(sample.roll_rad.abs() <= 0.35);
            assert!(sample.pitch_rad.abs() <= 0.25);
        }

        source.stop();
        let end = timeout(Duration::from_secs(2), samples.recv())
            .await
            .unwrap();
        assert!(end.is_none());
    }
}
