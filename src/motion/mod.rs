//! # Motion Pipeline
//!
//! Turns raw orientation/acceleration samples into the bounded-rate gesture
//! stream the controller consumes.
//!
//! ## Key Components:
//! - **Motion Source**: the sensor seam; delivers samples at a fixed interval
//! - **Event Encoder**: first-sample stream marking, fixed-rate tilt throttle,
//!   and threshold/cooldown tap detection
//!
//! The encoder applies no smoothing or physics model; angles are relayed as
//! instantaneous readings. The only temporal processing is the throttle and
//! the tap cooldown.

pub mod encoder;   // Sample-to-gesture state machine
pub mod source;    // Sensor seam and sample type
