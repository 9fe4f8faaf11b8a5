//! Drives a `Client` against a real `Agent` bound to an ephemeral port and
//! an in-process `bus::Broker`, exercising the handshake, inbound create
//! mirroring, and outbound `save`/`subscribe` framing end to end without a
//! Redis server or a real Zone.

use agent::{Agent, AgentConfig, AllowAll as AgentAllowAll};
use auth::AllowAll as AuthAllowAll;
use bus::{Bus, Broker};
use client::{Client, ClientConfig, NoopHooks};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use wire::{distributed_object, ClassRegistry, DistributedObject, WireError};

distributed_object! {
    pub struct Note {
        body: Str,
    }
}

fn note_ctor(
    id: String,
    fields: BTreeMap<String, Value>,
) -> Result<Box<dyn DistributedObject>, WireError> {
    Note::from_fields(id, fields).map(|n| Box::new(n) as Box<dyn DistributedObject>)
}

async fn spawn_agent() -> (std::net::SocketAddr, Arc<Broker>) {
    let broker = Broker::new();
    let agent_bus = Arc::new(broker.handle().await);

    let config = AgentConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        ..AgentConfig::default()
    };
    let agent = Agent::new(
        config,
        agent_bus,
        Arc::new(AuthAllowAll),
        Arc::new(AgentAllowAll),
        flux::logging::init("test-agent"),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(agent.serve_on(listener));
    (addr, broker)
}

#[tokio::test]
async fn connect_joins_and_mirrors_a_zone_published_create() {
    let (addr, broker) = spawn_agent().await;

    let mut registry = ClassRegistry::new();
    registry.register(Note::CODE_NAME, note_ctor).unwrap();

    let config = ClientConfig {
        agent_addr: addr.to_string(),
        ..ClientConfig::default()
    };
    let (client, reader) = Client::connect(
        config,
        registry,
        NoopHooks,
        json!({"token": "anything"}),
        flux::logging::init("test-client"),
    )
    .await
    .unwrap();

    let client_id = client.client_id().to_string();
    tokio::spawn(Arc::clone(&client).run(reader));

    client.subscribe("chat").await.unwrap();

    // Act as the Zone: observe the join, then publish a state-sync create
    // addressed only to this client.
    let zone_bus = broker.handle().await;
    zone_bus.subscribe("chat").await.unwrap();
    let join_msg = zone_bus.recv().await.unwrap();
    assert_eq!(join_msg.payload, client_id);

    zone_bus
        .publish(
            &format!("{}.create.Note", client_id),
            "{\"id\":\"n1\",\"zone\":\"chat\",\"body\":\"hi\"}",
        )
        .await
        .unwrap();

    // Give the client's receive loop a beat to apply the frame.
    for _ in 0..50 {
        if client.object_count().await == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(client.object_count().await, 1);
}

#[tokio::test]
async fn save_on_a_fresh_object_publishes_a_create_to_its_zone() {
    let (addr, broker) = spawn_agent().await;
    let listener_bus = broker.handle().await;
    listener_bus.subscribe("chat").await.unwrap();

    let config = ClientConfig {
        agent_addr: addr.to_string(),
        ..ClientConfig::default()
    };
    let (client, reader) = Client::connect(
        config,
        ClassRegistry::new(),
        NoopHooks,
        json!({"token": "anything"}),
        flux::logging::init("test-client"),
    )
    .await
    .unwrap();
    tokio::spawn(Arc::clone(&client).run(reader));

    let mut note = Note::new("n2".to_string(), "chat".to_string());
    note.set("body", "hello");
    client.save(&mut note).await.unwrap();

    let msg = listener_bus.recv().await.unwrap();
    assert_eq!(msg.channel.target, "chat");
    assert_eq!(msg.channel.code_name.as_deref(), Some("Note"));
    let payload: Value = serde_json::from_str(&msg.payload).unwrap();
    assert_eq!(payload["body"], Value::from("hello"));
}
