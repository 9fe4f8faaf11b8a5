//! The handshake contract the Agent requires: it reads one line of JSON
//! credentials, hands it to an `Authenticator`, and either gets a client id
//! to assign or closes the socket without a response.

use async_trait::async_trait;
use serde_json::Value;

/// Result of one authentication attempt. `Banned` is split out from
/// `Rejected` only so a reference implementation can log the distinction;
/// from the Agent's point of view both are a closed socket with no reply.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AuthOutcome {
    Accepted(String),
    Banned { reason: String },
    Rejected,
}

impl AuthOutcome {
    pub fn client_id(&self) -> Option<&str> {
        match self {
            AuthOutcome::Accepted(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Implemented by whatever credential-checking policy the embedding
/// application wants. `credentials` is the parsed JSON object read off the
/// client's first line, handed through verbatim -- the core does not
/// interpret its shape.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Value) -> AuthOutcome;
}

/// Accepts every connection, assigning the `client_id` field from the
/// credentials if present or else a random id. Useful for demos and tests
/// where authentication policy is out of scope.
pub struct AllowAll;

#[async_trait]
impl Authenticator for AllowAll {
    async fn authenticate(&self, credentials: &Value) -> AuthOutcome {
        let id = credentials
            .get("client_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        AuthOutcome::Accepted(id)
    }
}
