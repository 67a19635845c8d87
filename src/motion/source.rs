//! # Motion Source
//!
//! The sensor seam. A motion source delivers orientation (roll, pitch in
//! radians) and gravity-removed linear acceleration (x, y, z in g) at a
//! configured fixed interval. The core only consumes the sample channel; the
//! device integration behind it is not its concern.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::LinkResult;

/// One raw sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Roll in radians (positive = rightward tilt)
    pub roll_rad: f64,
    /// Pitch in radians, in the sensor's native sign convention
    pub pitch_rad: f64,
    /// Linear (gravity-removed) acceleration in g, as [x, y, z]
    pub accel_g: [f64; 3],
}

impl MotionSample {
    /// Magnitude of the linear acceleration vector, in g.
    pub fn accel_magnitude(&self) -> f64 {
        let [x, y, z] = self.accel_g;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Source of raw motion samples.
///
/// ## Contract:
/// - `start` configures the sampling interval and hands back the sample
///   channel; it fails with `AuthorizationDenied` when the sensor permission
///   is not granted, in which case the feature simply does not start.
/// - `stop` releases the sensor; the sample channel closes afterwards.
/// - Samples arrive in generation order.
pub trait MotionSource: Send + Sync {
    fn start(&self, period: Duration) -> LinkResult<mpsc::Receiver<MotionSample>>;
    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_magnitude() {
        let sample = MotionSample {
            roll_rad: 0.0,
            pitch_rad: 0.0,
            accel_g: [3.0, 4.0, 0.0],
        };
        assert_eq!(sample.accel_magnitude(), 5.0);
    }

    #[test]
    fn test_accel_magnitude_at_rest() {
        let sample = MotionSample {
            roll_rad: 0.1,
            pitch_rad: -0.2,
            accel_g: [0.0, 0.0, 0.0],
        };
        assert_eq!(sample.accel_magnitude(), 0.0);
    }
}
