//! In-Process Transport
//!
//! Direct channel-based communication between a chat surface and a trainer
//! running in the same process.
//!
//! # Usage
//!
//! ```ignore
//! let (transport, event_rx, msg_tx) = InProcessTransport::new_pair();
//!
//! // Give event_rx to Trainer::run and msg_tx to Trainer::new
//! // Use transport (or its parts) in the surface
//! ```

use tokio::sync::mpsc;

use crate::events::ChatEvent;
use crate::messages::BotMessage;

use super::TransportError;

const DEFAULT_CAPACITY: usize = 100;

/// Cloneable handle for pushing events to the trainer
///
/// Chat platforms deliver updates concurrently, so every update handler gets
/// its own clone.
#[derive(Clone, Debug)]
pub struct EventSender {
    event_tx: mpsc::Sender<ChatEvent>,
}

impl EventSender {
    /// Deliver an event to the trainer
    ///
    /// # Errors
    ///
    /// [`TransportError::SendFailed`] once the trainer has stopped.
    pub async fn send(&self, event: ChatEvent) -> Result<(), TransportError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| TransportError::SendFailed("Channel closed".to_string()))
    }
}

/// In-process transport using tokio channels
pub struct InProcessTransport {
    /// Events to the trainer
    events: EventSender,
    /// Messages from the trainer
    msg_rx: mpsc::Receiver<BotMessage>,
}

impl InProcessTransport {
    /// Create a new in-process transport pair
    ///
    /// Returns:
    /// - `InProcessTransport`: Use this in the surface
    /// - `mpsc::Receiver<ChatEvent>`: Trainer receives events here
    /// - `mpsc::Sender<BotMessage>`: Trainer sends messages here
    #[must_use]
    pub fn new_pair() -> (
        Self,
        mpsc::Receiver<ChatEvent>,
        mpsc::Sender<BotMessage>,
    ) {
        Self::new_pair_with_capacity(DEFAULT_CAPACITY)
    }

    /// Create with custom channel capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (tokio channels need room for one item).
    #[must_use]
    pub fn new_pair_with_capacity(
        capacity: usize,
    ) -> (
        Self,
        mpsc::Receiver<ChatEvent>,
        mpsc::Sender<BotMessage>,
    ) {
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (msg_tx, msg_rx) = mpsc::channel(capacity);

        let transport = Self {
            events: EventSender { event_tx },
            msg_rx,
        };

        (transport, event_rx, msg_tx)
    }

    /// Split into a cloneable event sender and the message receiver
    #[must_use]
    pub fn into_parts(self) -> (EventSender, mpsc::Receiver<BotMessage>) {
        (self.events, self.msg_rx)
    }

    /// Deliver an event to the trainer
    ///
    /// # Errors
    ///
    /// [`TransportError::SendFailed`] once the trainer has stopped.
    pub async fn send(&self, event: ChatEvent) -> Result<(), TransportError> {
        self.events.send(event).await
    }

    /// Wait for the next message from the trainer
    ///
    /// # Errors
    ///
    /// [`TransportError::ConnectionClosed`] once the trainer dropped its sender.
    pub async fn recv(&mut self) -> Result<BotMessage, TransportError> {
        self.msg_rx
            .recv()
            .await
            .ok_or(TransportError::ConnectionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatUser;
    use crate::messages::{ChatId, Keyboard};

    fn hello() -> ChatEvent {
        ChatEvent::from_text(ChatId(1), ChatUser::new(1, None, "One"), "hello")
    }

    #[tokio::test]
    async fn test_in_process_roundtrip() {
        let (mut transport, mut event_rx, msg_tx) = InProcessTransport::new_pair();

        transport.send(hello()).await.unwrap();
        let received_event = event_rx.recv().await.unwrap();
        assert!(matches!(received_event, ChatEvent::Text { ref text, .. } if text == "hello"));

        let msg = BotMessage::text(ChatId(1), "hi", Keyboard::Unchanged);
        msg_tx.send(msg.clone()).await.unwrap();
        assert_eq!(transport.recv().await.unwrap(), msg);
    }

    #[tokio::test]
    async fn test_senders_share_one_channel() {
        let (transport, mut event_rx, _msg_tx) = InProcessTransport::new_pair();
        let (sender, _msg_rx) = transport.into_parts();
        let clone = sender.clone();

        sender.send(hello()).await.unwrap();
        clone.send(hello()).await.unwrap();
        assert!(event_rx.recv().await.is_some());
        assert!(event_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_in_process_channel_closed() {
        let (transport, event_rx, msg_tx) = InProcessTransport::new_pair();
        let (sender, mut msg_rx) = transport.into_parts();

        drop(event_rx);
        let result = sender.send(hello()).await;
        assert!(matches!(result, Err(TransportError::SendFailed(_))));

        drop(msg_tx);
        assert!(msg_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_recv_after_trainer_stopped() {
        let (mut transport, _event_rx, msg_tx) = InProcessTransport::new_pair();
        drop(msg_tx);
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::ConnectionClosed)
        ));
    }
}
