use thiserror::Error;
use wire::WireError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("the agent closed the connection before assigning a client id")]
    Disconnected,

    /// The base client exposes no delete path: `save` on a deleted object
    /// is a programming error, not a wire-level condition.
    #[error("save() was called on a deleted object; the base client has no delete path")]
    DeleteNotSupported,
}
