//! # Controller Link
//!
//! Everything that touches the network: the single WebSocket session to the
//! remote controller, the outbound message funnel feeding it, and the
//! reconnect policy that keeps it alive.
//!
//! ## Key Components:
//! - **Connection Manager**: owns the session, handshake, keepalive, reconnect
//! - **Message Channel**: the one ordered path every producer publishes into
//! - **Backoff Policy**: capped exponential delays between connect attempts
//!
//! ## Failure Model:
//! All transport failures are non-fatal. The receive loop is the sole
//! reconnect trigger; send failures (including keepalive) only log and update
//! status. Recovery runs until an explicit disconnect.

pub mod backoff;   // Capped exponential reconnect delays
pub mod channel;   // Outbound message funnel
pub mod manager;   // Session state machine and link task
