//! Production implementation of the transport traits using Tokio channels.

use crate::error::EnvError;
use crate::publisher::Publisher;
use crate::subscription::Subscription;
use crate::types::Topic;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// Creates a connected publisher/subscription pair for one topic.
///
/// The channel is unbounded: publishers never block, matching the
/// "latest value wins" behavior of the upstream bus.
pub fn channel<M: Send + 'static>(topic: &str) -> (ChannelPublisher<M>, ChannelSubscription<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let topic = Topic::new(topic);
    (
        ChannelPublisher {
            topic: topic.clone(),
            tx,
        },
        ChannelSubscription {
            topic,
            rx: Mutex::new(rx),
        },
    )
}

/// Sending half of a topic channel.
#[derive(Debug)]
pub struct ChannelPublisher<M> {
    topic: Topic,
    tx: mpsc::UnboundedSender<M>,
}

impl<M> ChannelPublisher<M> {
    /// Returns the topic this publisher writes to.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Sends directly without going through the trait.
    pub fn send(&self, msg: M) -> Result<(), EnvError> {
        self.tx.send(msg).map_err(|_| EnvError::closed(&self.topic))
    }
}

impl<M> Clone for ChannelPublisher<M> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<M: Send> Publisher<M> for ChannelPublisher<M> {
    fn publish(&self, msg: M) -> Result<(), EnvError> {
        self.send(msg)
    }
}

/// Receiving half of a topic channel.
#[derive(Debug)]
pub struct ChannelSubscription<M> {
    topic: Topic,
    /// Receiver behind a tokio mutex so `recv` can take `&self`
    rx: Mutex<mpsc::UnboundedReceiver<M>>,
}

impl<M> ChannelSubscription<M> {
    /// Returns the topic this subscription reads from.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

#[async_trait]
impl<M: Send> Subscription<M> for ChannelSubscription<M> {
    async fn recv(&self) -> Option<M> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    fn try_recv(&self) -> Option<M> {
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }
}
