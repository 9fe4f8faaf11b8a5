//! Wires an Agent and a Zone together behind one `chat` zone, with the
//! `Message` distributed-object class registered on both. Exposed as a
//! library so both the binary and the integration tests can stand the
//! fabric up identically, against either a real Redis broker or an
//! in-process `bus::FakeBus`.

pub mod message;

pub use message::{register_classes, Message};

use async_trait::async_trait;
use bus::Bus;
use flux::logging::Logger;
use runner::ManagedServer;
use std::sync::Arc;
use wire::ClassRegistry;

/// Adapts an `agent::Agent` to `runner::ManagedServer` so it can be driven
/// by a `MultiServer` alongside a `Zone`.
pub struct AgentServer<B: Bus + 'static>(pub Arc<agent::Agent<B>>);

#[async_trait]
impl<B: Bus + 'static> ManagedServer for AgentServer<B> {
    fn name(&self) -> &str {
        "agent"
    }

    async fn run_forever(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Arc::clone(&self.0).serve().await?;
        Ok(())
    }
}

/// Adapts a `zone::Zone` to `runner::ManagedServer`.
pub struct ZoneServer<B: Bus + 'static, H: zone::ZoneHooks + 'static>(pub Arc<zone::Zone<B, H>>);

#[async_trait]
impl<B: Bus + 'static, H: zone::ZoneHooks + 'static> ManagedServer for ZoneServer<B, H> {
    fn name(&self) -> &str {
        "zone"
    }

    async fn run_forever(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Arc::clone(&self.0).serve().await?;
        Ok(())
    }
}

/// Builds the class registry this demo's Zone and Clients share.
pub fn registry() -> Result<ClassRegistry, wire::WireError> {
    let mut registry = ClassRegistry::new();
    register_classes(&mut registry)?;
    Ok(registry)
}

/// Starts a `chat`-zone `Zone` on `bus` and returns its handle, for tests
/// and the demo binary alike.
pub fn spawn_zone<B: Bus + 'static>(
    bus: Arc<B>,
    log: Logger,
) -> Result<Arc<zone::Zone<B, zone::NoopHooks>>, wire::WireError> {
    let config = zone::ZoneConfig::new("chat");
    Ok(zone::Zone::new(config, bus, registry()?, zone::NoopHooks, log))
}
