//! Drives the end-to-end scenarios: auth happy path, join & sync framing,
//! and malformed frames, against a real TCP socket and an in-process
//! `FakeBus`, so these properties are verified without a Redis server.

use agent::{Agent, AgentConfig, AllowAll};
use auth::AllowAll as AllowAllAuth;
use bus::{Bus, Broker};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

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
        Arc::new(AllowAllAuth),
        Arc::new(AllowAll),
        flux::logging::init("test-agent"),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(agent.serve_on(listener));
    (addr, broker)
}

#[tokio::test]
async fn auth_happy_path_assigns_a_client_id() {
    let (addr, _broker) = spawn_agent().await;

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(b"{\"client_id\":\"c1\"}\n").await.unwrap();

    let mut reader = BufReader::new(&mut socket);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line.trim_end(), "c1");
}

#[tokio::test]
async fn join_publishes_and_routes_the_zone_create_back_to_the_client() {
    let (addr, broker) = spawn_agent().await;

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(b"{\"client_id\":\"c1\"}\n").await.unwrap();

    let mut reader = BufReader::new(&mut socket);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line.trim_end(), "c1");

    // Act as the authoritative Zone: share the same broker.
    let zone_bus = broker.handle().await;
    zone_bus.subscribe("chat").await.unwrap();

    reader.get_mut().write_all(b"chat.join|\n").await.unwrap();

    // The Zone observes the join on the bus...
    let join_msg = zone_bus.recv().await.unwrap();
    assert_eq!(join_msg.channel.target, "chat");
    assert_eq!(join_msg.payload, "c1");

    // ...and publishes the state-sync create back to the joining client.
    zone_bus
        .publish("c1.create.Message", "{\"id\":\"m1\",\"zone\":\"chat\",\"text\":\"hi\"}")
        .await
        .unwrap();

    line.clear();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.contains("c1.create.Message"));
    assert!(line.contains("\\\"text\\\":\\\"hi\\\""));
}

#[tokio::test]
async fn malformed_frame_is_dropped_without_crashing_the_loop() {
    let (addr, _broker) = spawn_agent().await;

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(b"{\"client_id\":\"c1\"}\n").await.unwrap();

    let mut reader = BufReader::new(&mut socket);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();

    reader.get_mut().write_all(b"not a channel\n").await.unwrap();
    // Connection stays healthy: a well-formed frame sent right after is
    // still processed rather than the loop having died.
    reader.get_mut().write_all(b"c1.update|{}\n").await.unwrap();
    reader.get_mut().flush().await.unwrap();
}
