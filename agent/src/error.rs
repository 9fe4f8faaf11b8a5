use bus::BusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The broker connection is gone. Fatal at the outer runtime -- not
    /// recovered here.
    #[error("bus unavailable: {0}")]
    Bus(#[from] BusError),
}
