//! One live client connection, from the Agent's point of view: a stable
//! client id, the write half of the socket (writes serialize through its own
//! lock: one task, one reader, one writer per connection, writes serialized
//! through the writer's drain), and the set of zone targets this client has
//! joined.
//!
//! The `New`/`Authenticating` states of the connection lifecycle are not
//! represented here: a `Connection` is only constructed, and only
//! inserted into the Agent's connection set, once authentication has
//! already produced a client id -- so its mere existence in the map implies
//! `Active`. `Closing`/`Closed` are likewise implicit: once `disconnect` has
//! run, the id is gone from the map and no further frames reach it.

use std::collections::HashSet;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use wire::Channel;

pub struct Connection {
    pub id: String,
    pub writer: Mutex<OwnedWriteHalf>,
    pub subscriptions: Mutex<HashSet<String>>,
}

impl Connection {
    pub fn new(id: String, writer: OwnedWriteHalf) -> Connection {
        Connection {
            id,
            writer: Mutex::new(writer),
            subscriptions: Mutex::new(HashSet::new()),
        }
    }

    /// True iff `channel.target == self.id` (a whisper) or `channel.target`
    /// is a zone this client has joined.
    pub async fn responds_to(&self, channel: &Channel) -> bool {
        if channel.target == self.id {
            return true;
        }
        self.subscriptions.lock().await.contains(&channel.target)
    }
}
