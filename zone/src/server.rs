use crate::config::ZoneConfig;
use crate::error::ZoneError;
use crate::hooks::{HookAdapter, ZoneHooks};
use bus::{Bus, BusMessage};
use flux::logging::{self, Logger};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use wire::{Channel, ClassRegistry, DistributedObject, Method, ObjectStore};

/// The authoritative owner of a named zone's distributed objects: a
/// `ClassRegistry` of object classes it knows how to construct, and an
/// `ObjectStore` of every instance it currently holds, kept in sync with
/// every other process on the bus.
pub struct Zone<B: Bus + 'static, H: ZoneHooks> {
    config: ZoneConfig,
    bus: Arc<B>,
    registry: ClassRegistry,
    store: Mutex<ObjectStore<HookAdapter<H>>>,
    log: Logger,
}

impl<B: Bus + 'static, H: ZoneHooks> Zone<B, H> {
    pub fn new(
        config: ZoneConfig,
        bus: Arc<B>,
        registry: ClassRegistry,
        hooks: H,
        log: Logger,
    ) -> Arc<Zone<B, H>> {
        let store_log = log.new(logging::o!("component" => "store"));
        Arc::new(Zone {
            config,
            bus,
            registry,
            store: Mutex::new(ObjectStore::new(HookAdapter(hooks), store_log)),
            log,
        })
    }

    /// Subscribes to this zone's own target and to the global broadcast
    /// target, then drains the bus forever. Returns only on a fatal bus
    /// error.
    pub async fn serve(self: Arc<Self>) -> Result<(), ZoneError> {
        self.bus.subscribe(&self.config.zone_id).await?;
        self.bus.subscribe(&self.config.global_target).await?;
        logging::info!(self.log, "zone listening"; "zone_id" => &self.config.zone_id);

        loop {
            let msg = self.bus.recv().await?;
            if let Err(err) = self.handle_message(msg).await {
                logging::warn!(self.log, "dropping unhandled bus message"; "error" => %err);
            }
        }
    }

    async fn handle_message(&self, msg: BusMessage) -> Result<(), ZoneError> {
        let channel = msg.channel.clone();
        match channel.method {
            Method::Join => {
                let client_id = msg.payload.clone();
                {
                    let mut store = self.store.lock().await;
                    store.hooks_mut().0.client_connected(&client_id);
                }
                self.sync_client(&client_id).await
            }
            Method::Leave => {
                let client_id = msg.payload.clone();
                let mut store = self.store.lock().await;
                store.hooks_mut().0.client_disconnected(&client_id);
                Ok(())
            }
            Method::Create => self.handle_create(&channel, &msg.payload).await,
            Method::Update => self.handle_update(&msg.payload).await,
            Method::Delete => self.handle_delete(&msg.payload).await,
            Method::Call => {
                let args: Value = serde_json::from_str(&msg.payload).unwrap_or(Value::Null);
                let method_name = channel.code_name.clone().unwrap_or_default();
                let mut store = self.store.lock().await;
                store.hooks_mut().0.on_call(&channel.target, &method_name, args);
                Ok(())
            }
        }
    }

    async fn handle_create(&self, channel: &Channel, payload: &str) -> Result<(), ZoneError> {
        let code_name = channel
            .code_name
            .clone()
            .ok_or_else(|| ZoneError::UnknownObject("create message carried no code name".to_string()))?;
        let fields: BTreeMap<String, Value> = serde_json::from_str(payload)?;
        let id = match fields.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Err(ZoneError::UnknownObject("create payload missing id".to_string())),
        };

        let object = self.registry.construct(&code_name, id.clone(), fields)?;
        let mut store = self.store.lock().await;
        store.create(id, object);
        Ok(())
    }

    async fn handle_update(&self, payload: &str) -> Result<(), ZoneError> {
        let mut fields: BTreeMap<String, Value> = serde_json::from_str(payload)?;
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(ZoneError::UnknownObject("update payload missing id".to_string())),
        };
        fields.remove("zone");

        let mut store = self.store.lock().await;
        if let Err(err) = store.update(&id, fields) {
            // Out-of-order delta for an object this zone hasn't seen a
            // create for yet -- non-fatal.
            logging::debug!(self.log, "dropping update for unknown object"; "id" => %id, "error" => %err);
        }
        Ok(())
    }

    async fn handle_delete(&self, payload: &str) -> Result<(), ZoneError> {
        let fields: BTreeMap<String, Value> = serde_json::from_str(payload)?;
        let id = match fields.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Err(ZoneError::UnknownObject("delete payload missing id".to_string())),
        };

        let mut store = self.store.lock().await;
        let _ = store.delete(&id);
        Ok(())
    }

    /// Replays every object currently held as a `create` addressed only to
    /// `client_id`, in store order -- the join-time state sync a freshly
    /// joined client needs before it's considered caught up.
    async fn sync_client(&self, client_id: &str) -> Result<(), ZoneError> {
        let snapshots: Vec<(String, BTreeMap<String, Value>)> = {
            let store = self.store.lock().await;
            store
                .ids()
                .map(|id| {
                    let object = store.get(id).expect("id came from ids()");
                    (object.code_name().to_string(), object.snapshot())
                })
                .collect()
        };

        for (code_name, snapshot) in snapshots {
            let channel = Channel::new(client_id.to_string(), Method::Create, Some(code_name))?;
            let payload = serde_json::to_string(&snapshot)?;
            self.bus.publish(&channel.to_string(), &payload).await?;
        }
        Ok(())
    }

    /// Applies `object`'s pending change locally (firing lifecycle hooks)
    /// and then publishes it to the bus, in that order, so the authority
    /// reflects the change before any subscriber sees it on the bus. Takes
    /// the object by caller-owned reference rather than the store taking
    /// ownership: application code keeps its own handle to the object and
    /// calls `save` whenever it wants to flush pending writes.
    pub async fn save(&self, object: &mut dyn DistributedObject) -> Result<(), ZoneError> {
        let id = object.id().to_string();

        if object.is_deleted() {
            let mut store = self.store.lock().await;
            let _ = store.delete(&id);
            drop(store);

            let channel = Channel::new(self.config.zone_id.clone(), Method::Delete, None)?;
            let payload = serde_json::json!({ "id": id, "zone": object.zone() });
            self.bus.publish(&channel.to_string(), &payload.to_string()).await?;
            return Ok(());
        }

        if !object.is_created() {
            let code_name = object.code_name().to_string();
            let snapshot = object.snapshot();
            object.flush_delta();

            let constructed = self
                .registry
                .construct(&code_name, id.clone(), snapshot.clone())?;
            {
                let mut store = self.store.lock().await;
                store.create(id, constructed);
            }

            let channel = Channel::new(self.config.zone_id.clone(), Method::Create, Some(code_name))?;
            let payload = serde_json::to_string(&snapshot)?;
            self.bus.publish(&channel.to_string(), &payload).await?;
            return Ok(());
        }

        let delta = object.flush_delta();
        {
            let mut store = self.store.lock().await;
            store.update(&id, delta.clone())?;
        }

        let channel = Channel::new(self.config.zone_id.clone(), Method::Update, None)?;
        let payload = serde_json::to_string(&delta)?;
        self.bus.publish(&channel.to_string(), &payload).await?;
        Ok(())
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// How many objects this zone currently holds.
    pub async fn object_count(&self) -> usize {
        self.store.lock().await.len()
    }
}
