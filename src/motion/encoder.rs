//! # Motion Event Encoder
//!
//! Converts the raw ~60 Hz sample stream into a bounded-rate gesture stream.
//! Pure state machine: the driver task feeds it samples with a timestamp and
//! publishes whatever events come back, so every timing rule is testable with
//! explicit instants.
//!
//! ## Emission Rules:
//! - The first sample after activation emits exactly one `motion_started`
//!   and is consumed without angles; it only marks stream start.
//! - A later sample emits `tilt_angles` only when at least one target period
//!   has elapsed since the previous emission; otherwise it is dropped and no
//!   state changes.
//! - Tap detection runs on every raw sample regardless of the throttle:
//!   a linear-acceleration magnitude above the threshold emits `tap` unless
//!   the cooldown since the last tap has not elapsed.

use std::time::{Duration, Instant};

use crate::config::MotionConfig;
use crate::message::GestureEvent;
use crate::motion::source::MotionSample;

/// Sample-to-gesture state machine.
///
/// Owns the throttle state exclusively: the last emission timestamp (`None`
/// until the stream start is marked), and the last tap timestamp.
pub struct MotionEventEncoder {
    config: MotionConfig,
    period: Duration,
    last_emit: Option<Instant>,
    last_tap: Option<Instant>,
}

impl MotionEventEncoder {
    pub fn new(config: MotionConfig) -> Self {
        let period = config.sample_period();
        Self {
            config,
            period,
            last_emit: None,
            last_tap: None,
        }
    }

    /// Clear all throttle state. The next sample marks a fresh stream start
    /// and re-emits `motion_started`.
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.last_tap = None;
    }

    /// Ingest one raw sample taken at `now` and return the events it
    /// produces, in emission order. Tilt emission and tap detection are
    /// independent; both may fire from the same sample.
    pub fn ingest(&mut self, sample: &MotionSample, now: Instant) -> Vec<GestureEvent> {
        let mut events = Vec::new();

        match self.last_emit {
            None => {
                // First physical sample: consumed purely to mark stream start.
                self.last_emit = Some(now);
                events.push(GestureEvent::MotionStarted);
            }
            Some(last) => {
                let elapsed = now.duration_since(last);
                if elapsed >= self.period {
                    let (roll_deg, pitch_deg) = self.angles_deg(sample);
                    events.push(GestureEvent::TiltAngles {
                        roll_deg,
                        pitch_deg,
                        dt: elapsed.as_secs_f64(),
                    });
                    self.last_emit = Some(now);
                }
            }
        }

        if sample.accel_magnitude() > self.config.tap_threshold_g {
            let cooled = self
                .last_tap
                .map_or(true, |last| now.duration_since(last) >= self.config.tap_cooldown());
            if cooled {
                self.last_tap = Some(now);
                events.push(GestureEvent::Tap);
            }
        }

        events
    }

    /// Instantaneous angles in degrees. Roll is positive rightward in the
    /// sensor's own convention; pitch is flipped when configured so that
    /// forward tilt (cursor-down) comes out positive.
    fn angles_deg(&self, sample: &MotionSample) -> (f64, f64) {
        let roll_deg = sample.roll_rad.to_degrees();
        let pitch_deg = if self.config.invert_pitch {
            -sample.pitch_rad.to_degrees()
        } else {
            sample.pitch_rad.to_degrees()
        };
        (roll_deg, pitch_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_motion_config() -> MotionConfig {
        MotionConfig {
            sample_rate_hz: 60.0,
            tap_threshold_g: 1.10,
            tap_cooldown_ms: 250,
            invert_pitch: true,
            simulate: true,
        }
    }

    fn quiet(roll_rad: f64, pitch_rad: f64) -> MotionSample {
        MotionSample {
            roll_rad,
            pitch_rad,
            accel_g: [0.0, 0.0, 0.0],
        }
    }

    fn spike() -> MotionSample {
        MotionSample {
            roll_rad: 0.0,
            pitch_rad: 0.0,
            accel_g: [0.3, 0.2, 1.2],
        }
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_first_sample_emits_motion_started_only() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        let events = encoder.ingest(&quiet(0.5, 0.5), t0);
        assert_eq!(events, vec![GestureEvent::MotionStarted]);
    }

    #[test]
    fn test_throttle_enforces_minimum_gap() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        encoder.ingest(&quiet(0.1, 0.0), t0);

        // Faster than 60 Hz: within-period samples are dropped.
        assert!(encoder.ingest(&quiet(0.1, 0.0), at(t0, 5)).is_empty());
        assert!(encoder.ingest(&quiet(0.1, 0.0), at(t0, 10)).is_empty());

        let events = encoder.ingest(&quiet(0.1, 0.0), at(t0, 17));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GestureEvent::TiltAngles { .. }));

        // The dropped samples did not move the emission timestamp.
        assert!(encoder.ingest(&quiet(0.1, 0.0), at(t0, 22)).is_empty());
        assert!(encoder.ingest(&quiet(0.1, 0.0), at(t0, 27)).is_empty());

        let events = encoder.ingest(&quiet(0.1, 0.0), at(t0, 34));
        assert_eq!(events.len(), 1);
        match events[0] {
            GestureEvent::TiltAngles { dt, .. } => {
                // Measured from the previous emission at t0+17ms.
                assert!((dt - 0.017).abs() < 1e-9);
            }
            _ => panic!("expected tilt_angles"),
        }
    }

    #[test]
    fn test_tilt_carries_measured_dt() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        encoder.ingest(&quiet(0.0, 0.0), t0);
        let events = encoder.ingest(&quiet(0.0, 0.0), at(t0, 20));

        match events[0] {
            GestureEvent::TiltAngles { dt, .. } => assert!((dt - 0.020).abs() < 1e-9),
            _ => panic!("expected tilt_angles"),
        }
    }

    #[test]
    fn test_tap_cooldown() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();
        let count_taps = |events: &[GestureEvent]| {
            events.iter().filter(|e| matches!(e, GestureEvent::Tap)).count()
        };

        // t1 and t2 are closer than the cooldown: one tap for the pair.
        let t1 = encoder.ingest(&spike(), at(t0, 100));
        let t2 = encoder.ingest(&spike(), at(t0, 200));
        // t3 is a full cooldown after t1: second tap.
        let t3 = encoder.ingest(&spike(), at(t0, 500));

        assert_eq!(count_taps(&t1), 1);
        assert_eq!(count_taps(&t2), 0);
        assert_eq!(count_taps(&t3), 1);
    }

    #[test]
    fn test_tap_ignores_sub_threshold_magnitude() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        encoder.ingest(&quiet(0.0, 0.0), t0);
        let sample = MotionSample {
            roll_rad: 0.0,
            pitch_rad: 0.0,
            accel_g: [0.5, 0.5, 0.5], // magnitude ~0.87, below 1.10
        };
        let events = encoder.ingest(&sample, at(t0, 300));
        assert!(!events.iter().any(|e| matches!(e, GestureEvent::Tap)));
    }

    #[test]
    fn test_tap_fires_inside_throttle_window() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        encoder.ingest(&quiet(0.0, 0.0), t0);

        // 1ms later: the tilt throttle drops the sample, the tap does not.
        let events = encoder.ingest(&spike(), at(t0, 1));
        assert_eq!(events, vec![GestureEvent::Tap]);
    }

    #[test]
    fn test_pitch_sign_inversion() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        encoder.ingest(&quiet(0.0, 0.0), t0);
        let events = encoder.ingest(&quiet(0.2, 0.1), at(t0, 20));

        match events[0] {
            GestureEvent::TiltAngles {
                roll_deg,
                pitch_deg,
                ..
            } => {
                assert!((roll_deg - 0.2f64.to_degrees()).abs() < 1e-9);
                assert!((pitch_deg + 0.1f64.to_degrees()).abs() < 1e-9);
            }
            _ => panic!("expected tilt_angles"),
        }

        // Without inversion the native sign passes through.
        let mut config = test_motion_config();
        config.invert_pitch = false;
        let mut encoder = MotionEventEncoder::new(config);
        encoder.ingest(&quiet(0.0, 0.0), t0);
        match encoder.ingest(&quiet(0.0, 0.1), at(t0, 20))[0] {
            GestureEvent::TiltAngles { pitch_deg, .. } => {
                assert!((pitch_deg - 0.1f64.to_degrees()).abs() < 1e-9);
            }
            _ => panic!("expected tilt_angles"),
        }
    }

    #[test]
    fn test_reset_marks_a_fresh_stream() {
        let mut encoder = MotionEventEncoder::new(test_motion_config());
        let t0 = Instant::now();

        assert_eq!(encoder.ingest(&quiet(0.0, 0.0), t0), vec![GestureEvent::MotionStarted]);
        encoder.ingest(&quiet(0.0, 0.0), at(t0, 20));

        encoder.reset();

        let events = encoder.ingest(&quiet(0.0, 0.0), at(t0, 40));
        assert_eq!(events, vec![GestureEvent::MotionStarted]);
    }
}
