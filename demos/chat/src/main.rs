//! Runs an Agent and a `chat` Zone in one process against a real Redis
//! broker, for manual end-to-end testing: point a raw TCP client at
//! `127.0.0.1:8888`, authenticate, join `chat`, and save a `Message`.

use agent::{Agent, AgentConfig, AllowAll as AgentAllowAll};
use auth::AllowAll as AuthAllowAll;
use bus::RedisBus;
use clap::Parser;
use demo_chat::{AgentServer, ZoneServer};
use flux::logging;
use runner::{ManagedServer, MultiServer};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "demo-chat", version, about = "Agent + chat Zone in one process, backed by Redis.")]
struct Args {
    #[arg(long, default_value = "redis://127.0.0.1:6379")]
    bus_url: String,

    #[arg(long, default_value = "127.0.0.1:8888")]
    listen_addr: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let log = logging::init("demo-chat");

    let agent_bus = Arc::new(
        RedisBus::connect(&args.bus_url, log.new(logging::o!("role" => "agent-bus"))).await?,
    );
    let agent = Agent::new(
        AgentConfig {
            listen_addr: args.listen_addr.clone(),
            bus_url: args.bus_url.clone(),
            ..AgentConfig::default()
        },
        agent_bus,
        Arc::new(AuthAllowAll),
        Arc::new(AgentAllowAll),
        log.new(logging::o!("component" => "agent")),
    );

    let zone_bus = Arc::new(
        RedisBus::connect(&args.bus_url, log.new(logging::o!("role" => "zone-bus"))).await?,
    );
    let zone = demo_chat::spawn_zone(zone_bus, log.new(logging::o!("component" => "zone")))?;

    let servers: Vec<Arc<dyn ManagedServer>> = vec![
        Arc::new(AgentServer(agent)),
        Arc::new(ZoneServer(zone)),
    ];
    MultiServer::new(servers).run().await?;
    Ok(())
}
