use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus transport error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The background listener task has exited -- every remaining operation
    /// on this bus handle will fail the same way until the process is
    /// restarted.
    #[error("bus listener task is no longer running")]
    Unavailable,

    #[error("malformed channel on incoming message: {0}")]
    BadChannel(#[from] wire::WireError),
}
