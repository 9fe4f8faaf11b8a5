use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::hooks::{ClientHooks, HookAdapter};
use flux::logging::{self, Logger};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use wire::{Channel, ClassRegistry, Method, ObjectStore};

/// A connected replica: one TCP socket to an Agent, a class registry the
/// application supplies so inbound `create` messages can be turned into
/// live objects, and a local mirror of everything it has seen created.
pub struct Client<H: ClientHooks> {
    config: ClientConfig,
    client_id: String,
    registry: ClassRegistry,
    store: Mutex<ObjectStore<HookAdapter<H>>>,
    writer: Mutex<tokio::net::tcp::OwnedWriteHalf>,
    log: Logger,
}

impl<H: ClientHooks> Client<H> {
    /// Runs the one-line authentication handshake and returns the connected
    /// client together with its read half -- the
    /// caller drives the receive loop with `Client::run`, mirroring
    /// `Agent::serve`/`serve_on`'s split so the read half can be handed off
    /// explicitly instead of the constructor blocking forever.
    pub async fn connect(
        config: ClientConfig,
        registry: ClassRegistry,
        hooks: H,
        credentials: Value,
        log: Logger,
    ) -> Result<(Arc<Client<H>>, OwnedReadHalf), ClientError> {
        let stream = TcpStream::connect(&config.agent_addr).await?;
        let (read_half, mut writer) = stream.into_split();

        writer
            .write_all(format!("{}\n", credentials).as_bytes())
            .await?;

        let mut reader = BufReader::new(read_half);
        let mut id_line = String::new();
        let n = reader.read_line(&mut id_line).await?;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }
        let client_id = id_line.trim_end().to_string();
        logging::info!(log, "connected to agent"; "client_id" => &client_id);

        let store_log = log.new(logging::o!("component" => "store"));
        let client = Arc::new(Client {
            config,
            client_id,
            registry,
            store: Mutex::new(ObjectStore::new(HookAdapter(hooks), store_log)),
            writer: Mutex::new(writer),
            log,
        });

        Ok((client, reader.into_inner()))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Drains inbound `{"channel":...,"data":...}` frames until EOF or a
    /// transport error. Bounded reads with partial-tail carry-over, same
    /// shape as `Agent::message_loop`.
    pub async fn run(self: Arc<Self>, mut reader: OwnedReadHalf) -> Result<(), ClientError> {
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
                self.handle_frame(line).await;
            }
        }
        logging::info!(self.log, "agent connection closed"; "client_id" => &self.client_id);
        Ok(())
    }

    async fn handle_frame(&self, line: &str) {
        #[derive(serde::Deserialize)]
        struct Frame {
            channel: String,
            data: String,
        }

        let frame: Frame = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(err) => {
                logging::warn!(self.log, "dropping unparseable frame"; "error" => %err);
                return;
            }
        };

        let channel = match Channel::parse(&frame.channel) {
            Ok(channel) => channel,
            Err(err) => {
                logging::warn!(self.log, "dropping frame on a bad channel"; "error" => %err);
                return;
            }
        };

        // Mirrors the Zone's inbound dispatch but without authority: the
        // replica never originates a delete of its own, and
        // an update for an id it hasn't seen a create for is dropped rather
        // than guessed at -- there is no class tag on an `update` frame to
        // construct a new instance from.
        let result = match channel.method {
            Method::Create => self.apply_create(&channel, &frame.data),
            Method::Update => self.apply_update(&frame.data),
            Method::Delete => self.apply_delete(&frame.data),
            _ => {
                logging::debug!(self.log, "ignoring frame"; "channel" => %channel);
                return;
            }
        };

        if let Err(err) = result.await {
            logging::warn!(self.log, "dropping frame that failed to apply"; "channel" => %channel, "error" => %err);
        }
    }

    async fn apply_create(&self, channel: &Channel, payload: &str) -> Result<(), ClientError> {
        let code_name = channel
            .code_name
            .clone()
            .ok_or_else(|| ClientError::Wire(wire::WireError::BadChannel(channel.to_string())))?;
        let fields: BTreeMap<String, Value> = serde_json::from_str(payload)?;
        let id = match fields.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Ok(()),
        };

        let object = self.registry.construct(&code_name, id.clone(), fields)?;
        let mut store = self.store.lock().await;
        store.create(id, object);
        Ok(())
    }

    async fn apply_update(&self, payload: &str) -> Result<(), ClientError> {
        let mut fields: BTreeMap<String, Value> = serde_json::from_str(payload)?;
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Ok(()),
        };
        fields.remove("zone");

        let mut store = self.store.lock().await;
        if let Err(err) = store.update(&id, fields) {
            logging::debug!(self.log, "dropping update for an object not yet seen"; "id" => %id, "error" => %err);
        }
        Ok(())
    }

    async fn apply_delete(&self, payload: &str) -> Result<(), ClientError> {
        let fields: BTreeMap<String, Value> = serde_json::from_str(payload)?;
        let id = match fields.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Ok(()),
        };
        let mut store = self.store.lock().await;
        let _ = store.delete(&id);
        Ok(())
    }

    /// Authors a create or update, matching the Zone's `save` selector with
    /// the delete branch removed: the base client exposes no delete path.
    pub async fn save(&self, object: &mut dyn wire::DistributedObject) -> Result<(), ClientError> {
        if object.is_deleted() {
            return Err(ClientError::DeleteNotSupported);
        }

        let zone = object.zone().to_string();

        if !object.is_created() {
            let code_name = object.code_name().to_string();
            let snapshot = object.snapshot();
            object.flush_delta();

            let channel = Channel::new(zone, Method::Create, Some(code_name))?;
            let payload = serde_json::to_string(&snapshot)?;
            self.send_frame(&channel, &payload).await
        } else {
            let delta = object.flush_delta();
            let channel = Channel::new(zone, Method::Update, None)?;
            let payload = serde_json::to_string(&delta)?;
            self.send_frame(&channel, &payload).await
        }
    }

    /// Emits `Channel(target=zone_id, method=join)` with an empty payload.
    pub async fn subscribe(&self, zone_id: &str) -> Result<(), ClientError> {
        let channel = Channel::new(zone_id.to_string(), Method::Join, None)?;
        self.send_frame(&channel, "").await
    }

    /// Emits `Channel(target=zone_id, method=leave)` with an empty payload.
    pub async fn unsubscribe(&self, zone_id: &str) -> Result<(), ClientError> {
        let channel = Channel::new(zone_id.to_string(), Method::Leave, None)?;
        self.send_frame(&channel, "").await
    }

    async fn send_frame(&self, channel: &Channel, payload: &str) -> Result<(), ClientError> {
        let line = format!("{}|{}\n", channel, payload);
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    pub async fn object_count(&self) -> usize {
        self.store.lock().await.len()
    }
}
