//! # Speech Pipeline
//!
//! Turns the recognizer's noisy, repeating transcript candidates into
//! discrete, deduplicated commands.
//!
//! ## Key Components:
//! - **Speech Source**: the recognizer seam; delivers partial/final
//!   candidates and engine errors, supports cancel-and-restart
//! - **Rules**: pure text normalization (trim, case fold, gmail variants,
//!   literal "type " case preservation)
//! - **Command Normalizer**: debounce, repeat suppression, and the final
//!   dedup gate, in continuous or push-to-talk mode
//!
//! Recognition accuracy is not this module's concern; candidates are taken
//! as delivered.

pub mod normalizer;   // Debounce/dedup state machine
pub mod rules;        // Pure text normalization
pub mod source;       // Recognizer seam and candidate types
