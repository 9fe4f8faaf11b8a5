//! End-to-end: an Agent and a `chat` Zone on an in-process `bus::Broker`,
//! with two `Client` replicas joining the zone. One client authors a
//! `Message`; the other must see it mirrored without ever touching the
//! Zone directly.

use agent::{Agent, AgentConfig, AllowAll as AgentAllowAll};
use auth::AllowAll as AuthAllowAll;
use bus::Broker;
use client::{Client, ClientConfig, NoopHooks};
use demo_chat::Message;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_agent(broker: &Arc<Broker>) -> std::net::SocketAddr {
    let agent_bus = Arc::new(broker.handle().await);
    let agent = Agent::new(
        AgentConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..AgentConfig::default()
        },
        agent_bus,
        Arc::new(AuthAllowAll),
        Arc::new(AgentAllowAll),
        flux::logging::init("test-agent"),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(agent.serve_on(listener));
    addr
}

async fn connect(addr: std::net::SocketAddr) -> Arc<Client<NoopHooks>> {
    let config = ClientConfig {
        agent_addr: addr.to_string(),
        ..ClientConfig::default()
    };
    let (client, reader) = Client::connect(
        config,
        demo_chat::registry().unwrap(),
        NoopHooks,
        json!({"token": "anything"}),
        flux::logging::init("test-client"),
    )
    .await
    .unwrap();
    tokio::spawn(Arc::clone(&client).run(reader));
    client
}

#[tokio::test]
async fn a_message_saved_by_one_client_mirrors_to_another() {
    let broker = Broker::new();
    let zone_bus = Arc::new(broker.handle().await);
    let _zone = demo_chat::spawn_zone(zone_bus, flux::logging::init("test-zone")).unwrap();

    let addr = spawn_agent(&broker).await;
    let author = connect(addr).await;
    let reader = connect(addr).await;

    author.subscribe("chat").await.unwrap();
    reader.subscribe("chat").await.unwrap();

    // Let both joins reach the Zone and its (empty) state-sync settle
    // before the authored message is published, so the wait below can't
    // be satisfied by a stray earlier sync message.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut message = Message::new("m1".to_string(), "chat".to_string());
    message.set("text", "hello");
    message.set("author", author.client_id().to_string());
    author.save(&mut message).await.unwrap();

    for _ in 0..100 {
        if reader.object_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(reader.object_count().await, 1);

    // The author's own store reflects the save as a local echo too, once
    // its receive loop absorbs the Zone's broadcast of the create.
    for _ in 0..100 {
        if author.object_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(author.object_count().await, 1);
}
