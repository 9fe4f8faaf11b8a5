use agent::{Agent, AgentConfig, AllowAll};
use bus::RedisBus;
use clap::Parser;
use flux::logging;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pastry-agent", version, about = "Client-facing TCP gateway bridging to the bus.")]
struct Args {
    /// Path to a TOML config file. Falls back to `AgentConfig::default()`.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => flux::config::load(path)?,
        None => AgentConfig::default(),
    };

    let log = logging::init("agent");
    let bus = Arc::new(RedisBus::connect(&config.bus_url, log.new(logging::o!("role" => "bus"))).await?);
    let authenticator: Arc<dyn auth::Authenticator> = Arc::new(auth::AllowAll);
    let permissions = Arc::new(AllowAll);

    let server = Agent::new(config, bus, authenticator, permissions, log);
    server.serve().await?;
    Ok(())
}
