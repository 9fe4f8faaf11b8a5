//! The Zone server: the authoritative owner of a named zone's distributed
//! objects. Subscribes to its own target and the global
//! broadcast target, replays join-time state to newly-connected clients,
//! and applies every create/update/delete it sees locally before relaying
//! it back out over the bus.

pub mod config;
pub mod error;
pub mod hooks;
pub mod server;

pub use config::ZoneConfig;
pub use error::ZoneError;
pub use hooks::{NoopHooks, ZoneHooks};
pub use server::Zone;
