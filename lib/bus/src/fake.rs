//! An in-process stand-in for the Redis broker, so the agent/zone/client
//! message loops can be exercised in tests without a running `redis-server`.
//! Every `FakeBus` handed out by the same [`Broker`] behaves like a distinct
//! connection to one shared broker, matching the real `RedisBus`'s contract:
//! refcounted pattern subscriptions, fire-and-forget publish, and a
//! per-handle inbox drained by `poll`/`recv`.

use crate::adapter::Bus;
use crate::error::BusError;
use crate::message::BusMessage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use wire::Channel;

struct Subscriber {
    patterns: HashMap<String, usize>,
    sender: mpsc::UnboundedSender<BusMessage>,
}

#[derive(Default)]
struct BrokerState {
    subscribers: HashMap<u64, Subscriber>,
}

/// The shared "server" every [`FakeBus`] handle talks to. Construct one per
/// simulated Redis instance and hand out a `FakeBus` per server process
/// under test via [`Broker::handle`].
#[derive(Default)]
pub struct Broker {
    state: Mutex<BrokerState>,
    next_id: AtomicU64,
}

impl Broker {
    pub fn new() -> Arc<Broker> {
        Arc::new(Broker::default())
    }

    pub async fn handle(self: &Arc<Broker>) -> FakeBus {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().await;
        state.subscribers.insert(
            id,
            Subscriber {
                patterns: HashMap::new(),
                sender: tx,
            },
        );
        FakeBus {
            id,
            broker: Arc::clone(self),
            receiver: Mutex::new(rx),
        }
    }
}

fn pattern_matches(pattern: &str, channel: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(target) => channel.split('.').next() == Some(target),
        None => pattern == channel,
    }
}

pub struct FakeBus {
    id: u64,
    broker: Arc<Broker>,
    receiver: Mutex<mpsc::UnboundedReceiver<BusMessage>>,
}

#[async_trait]
impl Bus for FakeBus {
    async fn subscribe(&self, target: &str) -> Result<(), BusError> {
        let pattern = Channel::subscribe_pattern(target);
        let mut state = self.broker.state.lock().await;
        if let Some(sub) = state.subscribers.get_mut(&self.id) {
            *sub.patterns.entry(pattern).or_insert(0) += 1;
        }
        Ok(())
    }

    async fn unsubscribe(&self, target: &str) -> Result<(), BusError> {
        let pattern = Channel::subscribe_pattern(target);
        let mut state = self.broker.state.lock().await;
        if let Some(sub) = state.subscribers.get_mut(&self.id) {
            if let Some(count) = sub.patterns.get_mut(&pattern) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    sub.patterns.remove(&pattern);
                }
            }
        }
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        let parsed = Channel::parse(channel)?;
        let state = self.broker.state.lock().await;
        for sub in state.subscribers.values() {
            if sub.patterns.keys().any(|p| pattern_matches(p, channel)) {
                let _ = sub.sender.send(BusMessage {
                    channel: parsed.clone(),
                    payload: payload.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn poll(&self) -> Result<Option<BusMessage>, BusError> {
        let mut receiver = self.receiver.lock().await;
        match receiver.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(BusError::Unavailable),
        }
    }

    async fn recv(&self) -> Result<BusMessage, BusError> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await.ok_or(BusError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_only_reaches_subscribed_target() {
        let broker = Broker::new();
        let chat = broker.handle().await;
        let lobby = broker.handle().await;

        chat.subscribe("chat").await.unwrap();
        lobby.subscribe("lobby").await.unwrap();

        chat.publish("chat.join", "c1").await.unwrap();

        assert!(chat.poll().await.unwrap().is_some());
        assert!(lobby.poll().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refcounted_unsubscribe_keeps_other_subscribers_alive() {
        let broker = Broker::new();
        let a = broker.handle().await;

        a.subscribe("chat").await.unwrap();
        a.subscribe("chat").await.unwrap();
        a.unsubscribe("chat").await.unwrap();

        a.publish("chat.join", "c1").await.unwrap();
        assert!(a.poll().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unsubscribe_of_never_joined_target_is_a_no_op() {
        let broker = Broker::new();
        let a = broker.handle().await;
        a.unsubscribe("chat").await.unwrap();
    }
}
