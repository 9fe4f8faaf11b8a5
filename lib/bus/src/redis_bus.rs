//! Redis-backed implementation of [`Bus`]. One async connection is kept open
//! for `PUBLISH`; a second, dedicated pub/sub connection is owned by a
//! background task that serializes `PSUBSCRIBE`/`PUNSUBSCRIBE` commands
//! against incoming messages and forwards payload frames onto an unbounded
//! channel. `poll`/`recv` never touch the network directly -- they only
//! drain that channel, so the owning server is never blocked for more than
//! a bounded quantum.

use crate::adapter::Bus;
use crate::error::BusError;
use crate::message::BusMessage;
use async_trait::async_trait;
use flux::logging::{self, Logger};
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSub};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use wire::Channel;

enum Command {
    PSubscribe(String),
    PUnsubscribe(String),
}

pub struct RedisBus {
    publish_conn: Mutex<MultiplexedConnection>,
    commands: mpsc::UnboundedSender<Command>,
    inbox: Mutex<mpsc::UnboundedReceiver<BusMessage>>,
    refcounts: Mutex<HashMap<String, usize>>,
    log: Logger,
}

impl RedisBus {
    /// Opens the publish connection and the background subscription
    /// listener. `url` is a standard `redis://host:port/` address.
    pub async fn connect(url: &str, log: Logger) -> Result<RedisBus, BusError> {
        let client = redis::Client::open(url)?;
        let publish_conn = client.get_multiplexed_async_connection().await?;
        let pubsub_conn = client.get_async_connection().await?.into_pubsub();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let listener_log = log.new(logging::o!("task" => "bus-listener"));
        tokio::spawn(Self::listen(pubsub_conn, command_rx, message_tx, listener_log));

        Ok(RedisBus {
            publish_conn: Mutex::new(publish_conn),
            commands: command_tx,
            inbox: Mutex::new(message_rx),
            refcounts: Mutex::new(HashMap::new()),
            log,
        })
    }

    /// Owns the pub/sub connection for the lifetime of the bus. Alternates
    /// between draining pending subscribe/unsubscribe commands and reading
    /// the next message with a short timeout, so a subscribe issued while a
    /// read is outstanding is never starved for long -- the redis-rs
    /// `PubSub` type has no split sink/stream for concurrent use, so this
    /// lock-and-poll pattern is the idiomatic workaround.
    async fn listen(
        mut pubsub: PubSub,
        mut commands: mpsc::UnboundedReceiver<Command>,
        messages: mpsc::UnboundedSender<BusMessage>,
        log: Logger,
    ) {
        loop {
            while let Ok(cmd) = commands.try_recv() {
                let result = match &cmd {
                    Command::PSubscribe(pattern) => pubsub.psubscribe(pattern).await,
                    Command::PUnsubscribe(pattern) => pubsub.punsubscribe(pattern).await,
                };
                if let Err(err) = result {
                    logging::error!(log, "subscription command failed"; "error" => %err);
                }
            }

            let next = tokio::time::timeout(Duration::from_millis(50), pubsub.on_message().next()).await;
            match next {
                Ok(Some(msg)) => {
                    let channel_name: String = msg.get_channel_name().to_string();
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(err) => {
                            logging::warn!(log, "dropping message with undecodable payload"; "error" => %err);
                            continue;
                        }
                    };
                    match Channel::parse(&channel_name) {
                        Ok(channel) => {
                            if messages.send(BusMessage { channel, payload }).is_err() {
                                return;
                            }
                        }
                        Err(err) => {
                            logging::warn!(log, "dropping message on unparseable channel"; "channel" => channel_name, "error" => %err);
                        }
                    }
                }
                Ok(None) => return,
                Err(_timeout) => continue,
            }
        }
    }
}

#[async_trait]
impl Bus for RedisBus {
    async fn subscribe(&self, target: &str) -> Result<(), BusError> {
        let pattern = Channel::subscribe_pattern(target);
        let mut refcounts = self.refcounts.lock().await;
        let count = refcounts.entry(pattern.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.commands
                .send(Command::PSubscribe(pattern))
                .map_err(|_| BusError::Unavailable)?;
        }
        Ok(())
    }

    async fn unsubscribe(&self, target: &str) -> Result<(), BusError> {
        let pattern = Channel::subscribe_pattern(target);
        let mut refcounts = self.refcounts.lock().await;
        if let Some(count) = refcounts.get_mut(&pattern) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                refcounts.remove(&pattern);
                self.commands
                    .send(Command::PUnsubscribe(pattern))
                    .map_err(|_| BusError::Unavailable)?;
            }
        }
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        let mut conn = self.publish_conn.lock().await;
        redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn poll(&self) -> Result<Option<BusMessage>, BusError> {
        let mut inbox = self.inbox.lock().await;
        match inbox.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(BusError::Unavailable),
        }
    }

    async fn recv(&self) -> Result<BusMessage, BusError> {
        let mut inbox = self.inbox.lock().await;
        inbox.recv().await.ok_or(BusError::Unavailable)
    }
}

/// `RedisBus` is `Arc`-shared between a server's accept loop, its
/// per-connection tasks, and its bus-listener task.
pub type SharedRedisBus = Arc<RedisBus>;
