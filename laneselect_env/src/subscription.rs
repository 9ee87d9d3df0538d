//! Input side of the transport abstraction.

use async_trait::async_trait;

/// Abstraction for receiving messages of type `M`.
///
/// # Message Flow
///
/// ```text
/// Upstream                 Transport                 Lane selector
///   |                          |                          |
///   |-- publish(msg) --------->|                          |
///   |                          |-- [queue] -------------->|
///   |                          |                          |-- recv() -> msg
/// ```
#[async_trait]
pub trait Subscription<M: Send>: Send + Sync {
    /// Receives the next message.
    ///
    /// # Returns
    /// * `Some(msg)` - A message arrived
    /// * `None` - All senders are gone (shutdown)
    ///
    /// # Blocking
    /// Suspends until a message arrives or the topic closes.
    async fn recv(&self) -> Option<M>;

    /// Receives a message if one is already queued.
    fn try_recv(&self) -> Option<M>;
}
