use crate::error::BusError;
use crate::message::BusMessage;
use async_trait::async_trait;

/// The subscribe/unsubscribe/publish/poll contract every server process
/// talks to the internal bus through. `Agent`, `Zone` and `Client` are
/// generic over this rather than depending on `RedisBus` directly, so
/// tests can swap in a local in-process fake (see `FakeBus`).
#[async_trait]
pub trait Bus: Send + Sync {
    /// Subscribes to every channel addressed to `target` (wire pattern
    /// `target.*`). Refcounted: a target already subscribed from elsewhere
    /// in the process has its count bumped rather than issuing a redundant
    /// subscribe to the transport.
    async fn subscribe(&self, target: &str) -> Result<(), BusError>;

    /// Drops one reference to `target`'s subscription. Only unsubscribes
    /// from the transport once the count reaches zero; unsubscribing a
    /// target with no outstanding references is a harmless no-op.
    async fn unsubscribe(&self, target: &str) -> Result<(), BusError>;

    /// Publishes `payload` on `channel`.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError>;

    /// Non-blocking: returns the next buffered message, or `None` if
    /// nothing is waiting right now. Never awaits network I/O itself --
    /// that happens on the background listener task.
    async fn poll(&self) -> Result<Option<BusMessage>, BusError>;

    /// Suspends until the next message addressed to this handle arrives.
    /// This is the bus-poll suspension point: rather than a sleep-and-retry
    /// timer, it awaits the background listener's channel directly, so a
    /// server's message loop yields the executor without busy-spinning.
    /// Returns `BusError::Unavailable` once the background listener task
    /// has exited.
    async fn recv(&self) -> Result<BusMessage, BusError>;
}
