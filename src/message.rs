//! # Wire Messages
//!
//! Outbound message types for the controller link. Every frame on the wire is
//! a single JSON object tagged by `type`; gesture frames carry a second
//! `kind` tag for the gesture variant.
//!
//! ## Message Format:
//! - `{"type":"hello","from":"ios"}` (handshake, sent once per connect)
//! - `{"type":"gesture","kind":"motion_started"}`
//! - `{"type":"gesture","kind":"tilt_angles","roll_deg":…,"pitch_deg":…,"dt":…}`
//! - `{"type":"gesture","kind":"tap"}`
//! - `{"type":"gesture","kind":"gestures_toggle","enabled":…}`
//! - `{"type":"command","text":…}`
//!
//! The keepalive ping is a bare text frame, not JSON, and is produced directly
//! by the connection manager rather than through these types.

use serde::{Deserialize, Serialize};

use crate::error::LinkResult;

/// Outbound message types for client-controller communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Handshake announcing this client to the controller. Sent once per
    /// connection attempt; no reply is awaited.
    #[serde(rename = "hello")]
    Hello {
        /// Client identifier the controller logs (e.g. "ios")
        from: String,
    },

    /// Motion-derived gesture event
    #[serde(rename = "gesture")]
    Gesture(GestureEvent),

    /// Normalized speech command
    #[serde(rename = "command")]
    Command(CommandEvent),
}

/// Gesture event variants emitted by the motion encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GestureEvent {
    /// Marks the start of a motion stream; always the first event after
    /// motion is activated, never carries angles
    #[serde(rename = "motion_started")]
    MotionStarted,

    /// Throttled instantaneous tilt reading
    #[serde(rename = "tilt_angles")]
    TiltAngles {
        /// Roll angle in degrees (positive = rightward tilt)
        roll_deg: f64,
        /// Pitch angle in degrees (positive = forward tilt)
        pitch_deg: f64,
        /// Measured seconds since the previous emission
        dt: f64,
    },

    /// Discrete tap/knock detected from the acceleration magnitude
    #[serde(rename = "tap")]
    Tap,

    /// Informational toggle of the gesture feature, for the remote side only
    #[serde(rename = "gestures_toggle")]
    GesturesToggle {
        /// Whether gestures are enabled on the client
        enabled: bool,
    },
}

/// A normalized command derived from speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Normalized command text. Lowercased and trimmed, except literal
    /// "type " commands which keep the speaker's original casing.
    pub text: String,
}

impl OutboundMessage {
    /// Serialize this message to its wire text frame.
    pub fn to_wire(&self) -> LinkResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
