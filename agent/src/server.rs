use crate::config::AgentConfig;
use crate::connection::Connection;
use crate::error::AgentError;
use crate::permission::PermissionGuard;
use auth::Authenticator;
use bus::{Bus, BusMessage};
use flux::logging::{self, Logger};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use wire::{Channel, Method};

/// The client-facing TCP gateway: accepts sockets, runs the one-line
/// authentication handshake, and bridges each connection to the bus.
/// Generic over `Bus` so tests can drive it against `bus::FakeBus` instead
/// of a live Redis broker.
pub struct Agent<B: Bus + 'static> {
    config: AgentConfig,
    bus: Arc<B>,
    authenticator: Arc<dyn Authenticator>,
    permissions: Arc<dyn PermissionGuard>,
    connections: Mutex<HashMap<String, Arc<Connection>>>,
    log: Logger,
}

impl<B: Bus + 'static> Agent<B> {
    pub fn new(
        config: AgentConfig,
        bus: Arc<B>,
        authenticator: Arc<dyn Authenticator>,
        permissions: Arc<dyn PermissionGuard>,
        log: Logger,
    ) -> Arc<Agent<B>> {
        Arc::new(Agent {
            config,
            bus,
            authenticator,
            permissions,
            connections: Mutex::new(HashMap::new()),
            log,
        })
    }

    /// Runs the accept loop and the bus-listener loop concurrently. Returns
    /// only on a fatal error (listener bind failure, or `BusUnavailable`).
    pub async fn serve(self: Arc<Self>) -> Result<(), AgentError> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        logging::info!(self.log, "agent listening"; "addr" => &self.config.listen_addr);
        self.serve_on(listener).await
    }

    /// Like `serve`, but against an already-bound listener -- lets tests
    /// bind to an ephemeral port (`127.0.0.1:0`) and read back the real
    /// address before handing it to the Agent.
    pub async fn serve_on(self: Arc<Self>, listener: TcpListener) -> Result<(), AgentError> {
        let accept_loop = Arc::clone(&self).accept_loop(listener);
        let bus_loop = Arc::clone(&self).bus_listener_loop();
        tokio::try_join!(accept_loop, bus_loop)?;
        Ok(())
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) -> Result<(), AgentError> {
        loop {
            let (socket, peer) = listener.accept().await?;
            let agent = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = agent.handle_connection(socket).await {
                    logging::warn!(agent.log, "connection ended with an error"; "peer" => %peer, "error" => %err);
                }
            });
        }
    }

    /// One per-connection task: read credentials, authenticate, assign id,
    /// subscribe, then enter the message loop.
    async fn handle_connection(self: Arc<Self>, socket: TcpStream) -> Result<(), AgentError> {
        let (read_half, mut writer) = socket.into_split();
        let mut reader = BufReader::new(read_half);

        let mut credentials_line = String::new();
        let n = reader.read_line(&mut credentials_line).await?;
        if n == 0 {
            return Ok(());
        }

        let credentials: Value = match serde_json::from_str(credentials_line.trim_end()) {
            Ok(value) => value,
            Err(_) => return Ok(()),
        };

        let outcome = self.authenticator.authenticate(&credentials).await;
        let client_id = match outcome.client_id() {
            Some(id) => id.to_string(),
            // AuthFailed: close without acknowledgment.
            None => return Ok(()),
        };

        writer.write_all(format!("{}\n", client_id).as_bytes()).await?;
        self.bus.subscribe(&client_id).await?;

        let connection = Arc::new(Connection::new(client_id.clone(), writer));
        self.connections
            .lock()
            .await
            .insert(client_id.clone(), Arc::clone(&connection));
        logging::info!(self.log, "client authenticated"; "client_id" => &client_id);

        let result = self.message_loop(&client_id, &connection, reader).await;
        self.disconnect(&client_id, &connection).await;
        result
    }

    async fn message_loop(
        &self,
        client_id: &str,
        connection: &Arc<Connection>,
        mut reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    ) -> Result<(), AgentError> {
        let mut carry = String::new();
        let mut buf = vec![0u8; self.config.max_packet_size];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            carry.push_str(&String::from_utf8_lossy(&buf[..n]));

            while let Some(pos) = carry.find('\n') {
                let line: String = carry.drain(..=pos).collect();
                let line = line.trim_end_matches(['\n', '\r']);
                if line.is_empty() {
                    continue;
                }
                self.handle_client_line(client_id, connection, line).await;
            }
        }
        Ok(())
    }

    /// Parses one `channel|payload` envelope and dispatches it per the
    /// message-loop rules: join/leave manage subscriptions, everything
    /// else is forwarded verbatim to the bus.
    async fn handle_client_line(&self, client_id: &str, connection: &Arc<Connection>, line: &str) {
        let (channel_str, payload) = match line.split_once('|') {
            Some(pair) => pair,
            None => {
                logging::warn!(self.log, "dropping malformed envelope"; "client_id" => client_id, "line" => line);
                return;
            }
        };

        let channel = match Channel::parse(channel_str) {
            Ok(channel) => channel,
            Err(err) => {
                logging::warn!(self.log, "bad channel"; "client_id" => client_id, "error" => %err);
                return;
            }
        };

        if !self.permissions.allow(client_id, &channel) {
            logging::warn!(self.log, "rejected by permission guard"; "client_id" => client_id, "channel" => %channel);
            return;
        }

        match channel.method {
            Method::Join => {
                let target = channel.target.clone();
                connection.subscriptions.lock().await.insert(target.clone());
                if let Err(err) = self.bus.subscribe(&target).await {
                    logging::warn!(self.log, "bus subscribe failed"; "target" => &target, "error" => %err);
                    return;
                }
                if let Ok(join) = Channel::new(target.clone(), Method::Join, None) {
                    let _ = self.bus.publish(&join.to_string(), client_id).await;
                }
                logging::info!(self.log, "client joined"; "client_id" => client_id, "target" => &target);
            }
            Method::Leave => {
                let target = channel.target.clone();
                connection.subscriptions.lock().await.remove(&target);
                if let Ok(leave) = Channel::new(target.clone(), Method::Leave, None) {
                    let _ = self.bus.publish(&leave.to_string(), client_id).await;
                }
                let _ = self.bus.unsubscribe(&target).await;
                logging::info!(self.log, "client left"; "client_id" => client_id, "target" => &target);
            }
            _ => {
                let _ = self.bus.publish(&channel.to_string(), payload).await;
            }
        }
    }

    /// Runs on EOF, transport error, or `kick`: emits a leave for every
    /// still-held subscription, unsubscribes the client id target, and
    /// removes the connection.
    async fn disconnect(&self, client_id: &str, connection: &Arc<Connection>) {
        let targets: Vec<String> = connection.subscriptions.lock().await.drain().collect();
        for target in targets {
            if let Ok(leave) = Channel::new(target.clone(), Method::Leave, None) {
                let _ = self.bus.publish(&leave.to_string(), client_id).await;
            }
            let _ = self.bus.unsubscribe(&target).await;
        }
        let _ = self.bus.unsubscribe(client_id).await;
        self.connections.lock().await.remove(client_id);
        logging::info!(self.log, "client disconnected"; "client_id" => client_id);
    }

    /// Admin-initiated termination of the reserved `kick` primitive: shuts
    /// down the connection's write half (the client sees
    /// EOF) and runs the normal disconnect path immediately rather than
    /// waiting for the read side to notice.
    pub async fn kick(&self, client_id: &str) -> bool {
        let connection = match self.connections.lock().await.get(client_id).cloned() {
            Some(connection) => connection,
            None => return false,
        };
        let _ = connection.writer.lock().await.shutdown().await;
        self.disconnect(client_id, &connection).await;
        true
    }

    async fn bus_listener_loop(self: Arc<Self>) -> Result<(), AgentError> {
        loop {
            let msg = self.bus.recv().await?;
            self.fan_out(msg).await;
        }
    }

    /// Bus → clients fan-out: every live connection whose
    /// `responds_to` is true gets the frame; a write failure removes that
    /// connection from the set. No permission check happens here --
    /// permission is enforced only on ingress.
    async fn fan_out(&self, msg: BusMessage) {
        let frame = serde_json::json!({
            "channel": msg.channel.to_string(),
            "data": msg.payload,
        });
        let line = format!("{}\n", frame);

        let snapshot: Vec<(String, Arc<Connection>)> = {
            let connections = self.connections.lock().await;
            connections.iter().map(|(id, c)| (id.clone(), Arc::clone(c))).collect()
        };

        let mut dead = Vec::new();
        for (id, connection) in snapshot {
            if !connection.responds_to(&msg.channel).await {
                continue;
            }
            let mut writer = connection.writer.lock().await;
            if writer.write_all(line.as_bytes()).await.is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.lock().await;
            for id in dead {
                connections.remove(&id);
            }
        }
    }

    #[cfg(test)]
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
