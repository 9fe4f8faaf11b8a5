use bus::BusError;
use thiserror::Error;
use wire::{StoreError, WireError};

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("payload serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("no object with id {0}")]
    UnknownObject(String),
}
