use bus::RedisBus;
use clap::Parser;
use flux::logging;
use std::sync::Arc;
use wire::ClassRegistry;
use zone::{NoopHooks, Zone, ZoneConfig};

#[derive(Parser)]
#[command(name = "pastry-zone", version, about = "Authoritative owner of a named zone's distributed objects.")]
struct Args {
    /// Path to a TOML config file. Falls back to `ZoneConfig::default()`.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config: ZoneConfig = match &args.config {
        Some(path) => flux::config::load(path)?,
        None => ZoneConfig::default(),
    };

    let log = logging::init("zone");
    let bus = Arc::new(RedisBus::connect(&config.bus_url, log.new(logging::o!("role" => "bus"))).await?);

    // Embedding binaries register their own distributed-object classes here
    // before serving; the bare zone binary carries none of its own.
    let registry = ClassRegistry::new();

    let server = Zone::new(config, bus, registry, NoopHooks, log);
    server.serve().await?;
    Ok(())
}
