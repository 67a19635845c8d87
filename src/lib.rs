//! # Handsfree Link
//!
//! Client core for a handheld device that streams motion gestures and voice
//! commands to a remote controller over a single WebSocket. The crate owns
//! the connection lifecycle end to end: dialing, handshake, keepalive,
//! reconnect backoff, and a bounded outbound funnel that merges the gesture
//! and command pipelines into one ordered stream.
//!
//! ## Architecture:
//! - **controller**: the sole control surface; owns the pipelines and tasks
//! - **link**: connection manager, reconnect policy, outbound message funnel
//! - **motion**: sample source trait and the tilt/tap gesture encoder
//! - **speech**: transcript source trait and the command normalizer
//! - **message**: JSON wire frames shared by both pipelines
//! - **status**: observable snapshot the presentation layer subscribes to
//! - **sim**: simulated sources so the whole pipeline runs without hardware
//!
//! ## Concurrency Model:
//! Every piece of mutable state is owned by exactly one task and fed through
//! channels; timers live with the state they pace. The pure state machines
//! (encoder, normalizer, backoff) take explicit time arguments so their rules
//! are testable without a runtime.

pub mod config;      // Configuration management (config.rs)
pub mod controller;  // Control surface and pipeline drivers (controller.rs)
pub mod error;       // Error handling types (error.rs)
pub mod link;        // Connection manager and outbound funnel (link/ directory)
pub mod message;     // Wire frame types (message.rs)
pub mod motion;      // Motion source trait and gesture encoder (motion/ directory)
pub mod sim;         // Simulated sensor sources (sim.rs)
pub mod speech;      // Speech source trait and command normalizer (speech/ directory)
pub mod status;      // Observable status snapshot (status.rs)

pub use config::AppConfig;
pub use controller::Controller;
pub use error::{LinkError, LinkResult};
pub use status::{ConnectionStatus, StatusSnapshot};
