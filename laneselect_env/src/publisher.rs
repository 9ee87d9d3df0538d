//! Output side of the transport abstraction.

use crate::error::EnvError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Abstraction for publishing messages of type `M`.
///
/// # Implementations
///
/// - **Production**: [`ChannelPublisher`](crate::ChannelPublisher) feeding a bridge task
/// - **Simulation / tests**: [`RecordingPublisher`] keeping every message in order
///
/// Publishing is synchronous and never blocks: the lane selector issues all
/// publishes for a tick back-to-back after its computation finished.
pub trait Publisher<M>: Send + Sync {
    /// Publishes one message.
    ///
    /// # Returns
    /// * `Ok(())` - Message handed to the transport
    /// * `Err(EnvError::TopicClosed)` - Nobody listens anymore
    fn publish(&self, msg: M) -> Result<(), EnvError>;
}

/// Publisher that records every message in publish order.
///
/// Clones share the same buffer, so a harness can keep one handle while the
/// node owns another. A panic in another holder of the buffer does not lose
/// what was recorded: a poisoned lock is recovered.
#[derive(Debug)]
pub struct RecordingPublisher<M> {
    log: Arc<Mutex<Vec<M>>>,
}

impl<M> RecordingPublisher<M> {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<M>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<M> {
        std::mem::take(&mut *self.buffer())
    }

    /// Number of messages currently buffered.
    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Clone> RecordingPublisher<M> {
    /// Returns a copy of the buffered messages without clearing them.
    pub fn snapshot(&self) -> Vec<M> {
        self.buffer().clone()
    }
}

impl<M> Clone for RecordingPublisher<M> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

impl<M> Default for RecordingPublisher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send> Publisher<M> for RecordingPublisher<M> {
    fn publish(&self, msg: M) -> Result<(), EnvError> {
        self.buffer().push(msg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_publisher_keeps_order() {
        let recorder = RecordingPublisher::new();
        recorder.publish(1).unwrap();
        recorder.publish(2).unwrap();
        recorder.publish(3).unwrap();

        assert_eq!(recorder.len(), 3);
        assert_eq!(recorder.drain(), vec![1, 2, 3]);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_recording_publisher_clones_share_buffer() {
        let recorder = RecordingPublisher::new();
        let handle = recorder.clone();

        recorder.publish("lane").unwrap();

        assert_eq!(handle.snapshot(), vec!["lane"]);
        // Snapshot does not consume
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_recording_publisher_survives_poisoned_lock() {
        let recorder = RecordingPublisher::new();
        recorder.publish(1).unwrap();

        let handle = recorder.clone();
        let crashed = std::thread::spawn(move || {
            let _guard = handle.log.lock().unwrap();
            panic!("holder crashed");
        })
        .join();
        assert!(crashed.is_err());
        assert!(recorder.log.is_poisoned());

        recorder.publish(2).unwrap();
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.snapshot(), vec![1, 2]);
        assert_eq!(recorder.drain(), vec![1, 2]);
        assert!(recorder.is_empty());
    }
}
