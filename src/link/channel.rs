//! # Message Channel
//!
//! The single ordered funnel for outbound messages. Every producer publishes
//! through a clone of [`MessageChannel`], and the connection manager's link
//! task is the only consumer, so the network never sees interleaved or
//! half-constructed frames.
//!
//! Publishing is fire-and-forget: when no session is open the link task
//! drains and discards the queue, and a full queue drops the newest message.
//! No buffering or replay is guaranteed.

use tokio::sync::mpsc;
use tracing::debug;

use crate::message::OutboundMessage;

/// Cloneable publish handle to the outbound funnel.
#[derive(Clone)]
pub struct MessageChannel {
    tx: mpsc::Sender<OutboundMessage>,
}

impl MessageChannel {
    pub(crate) fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { tx }
    }

    /// Publish a message toward the link. Never blocks the caller; the
    /// message is silently dropped when the queue is full or the link task
    /// is gone.
    pub fn publish(&self, message: OutboundMessage) {
        if let Err(err) = self.tx.try_send(message) {
            match err {
                mpsc::error::TrySendError::Full(msg) => {
                    debug!("Outbound queue full, dropping {:?}", msg);
                }
                mpsc::error::TrySendError::Closed(msg) => {
                    debug!("Link task gone, dropping {:?}", msg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CommandEvent, GestureEvent};

    #[test]
    fn test_publish_preserves_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let channel = MessageChannel::new(tx);

        channel.publish(OutboundMessage::Gesture(GestureEvent::MotionStarted));
        channel.publish(OutboundMessage::Gesture(GestureEvent::Tap));
        channel.publish(OutboundMessage::Command(CommandEvent {
            text: "open gmail".to_string(),
        }));

        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundMessage::Gesture(GestureEvent::MotionStarted)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundMessage::Gesture(GestureEvent::Tap)
        );
        assert!(matches!(rx.try_recv().unwrap(), OutboundMessage::Command(_)));
    }

    #[test]
    fn test_publish_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let channel = MessageChannel::new(tx);

        channel.publish(OutboundMessage::Gesture(GestureEvent::Tap));
        channel.publish(OutboundMessage::Gesture(GestureEvent::MotionStarted));

        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundMessage::Gesture(GestureEvent::Tap)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_after_consumer_gone_is_silent() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let channel = MessageChannel::new(tx);

        // Must not panic or block
        channel.publish(OutboundMessage::Gesture(GestureEvent::Tap));
    }
}
